// Web front-end
// Askama server-side rendering over the catalog API client

mod templates;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::unverified_expiry;
use crate::client::ClientError;
use crate::db::Product;
use crate::session::{new_session_id, SessionData};
use crate::WebState;

pub use templates::*;

// Session id cookie name
const SESSION_COOKIE: &str = "catalog_session";

const LIST_PATH: &str = "/Products";
const LOGIN_PATH: &str = "/Auth/Login";

// Helper to render templates and handle errors
fn render_template<T: Template>(template: T) -> Response {
    render_with_status(StatusCode::OK, template)
}

fn render_with_status<T: Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e)).into_response()
        }
    }
}

fn error_view(err: &ClientError) -> Response {
    let message = match err {
        ClientError::Unauthorized => "Unauthorized.",
        ClientError::NotFound => "Product not found.",
        ClientError::Failure(_) => "The catalog service returned an error.",
        ClientError::Transport(_) => "The catalog service is unavailable.",
    };
    let status = err.status();

    render_with_status(
        status,
        ErrorTemplate {
            status: status.as_u16(),
            message: message.to_string(),
        },
    )
}

pub fn create_router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/Products", get(products_index))
        .route("/Products/Index", get(products_index))
        .route("/Products/Create", get(create_form).post(create_submit))
        .route("/Products/Edit/:id", get(edit_form).post(edit_submit))
        .route("/Products/Delete/:id", post(delete_submit))
        .route("/Auth/Login", get(login_page).post(login_submit))
        .route("/Auth/Logout", get(logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Session handling

fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Cookie id (if any) and the live session data behind it. Reading a live
/// session slides its expiry forward.
fn load_session(jar: &CookieJar, state: &WebState) -> (Option<String>, SessionData) {
    let Some(id) = session_id(jar) else {
        return (None, SessionData::default());
    };

    match state.sessions.get(&id) {
        Some(data) => {
            state
                .sessions
                .touch(&id, session_ttl(state, data.token.as_deref()));
            (Some(id), data)
        }
        None => (Some(id), SessionData::default()),
    }
}

fn session_token(jar: &CookieJar, state: &WebState) -> Option<String> {
    load_session(jar, state).1.token
}

/// Configured idle TTL, cut short by the cached token's own expiry
fn session_ttl(state: &WebState, token: Option<&str>) -> Duration {
    let ttl = Duration::minutes(state.config.web.session_ttl_minutes);
    match token.and_then(unverified_expiry) {
        Some(expires_at) => ttl.min(expires_at - Utc::now()),
        None => ttl,
    }
}

/// Persist `data`, issuing a new session id when there is none yet.
fn save_session(
    jar: CookieJar,
    state: &WebState,
    id: Option<String>,
    data: SessionData,
) -> CookieJar {
    let ttl = session_ttl(state, data.token.as_deref());
    let (id, is_new) = match id {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    };

    state.sessions.set(&id, data, ttl);

    if is_new {
        jar.add(
            Cookie::build((SESSION_COOKIE, id))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.config.web.secure_cookies)
                .build(),
        )
    } else {
        jar
    }
}

// Form parsing

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
}

impl ProductForm {
    fn values(&self) -> ProductFormValues {
        ProductFormValues {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            stock: self.stock.clone(),
        }
    }

    /// Build the product to send, with `id` taken from the route when editing.
    fn parse(&self, id: Option<i64>) -> Result<Product, String> {
        let id = match id {
            Some(id) => id,
            None if self.id.trim().is_empty() => 0,
            None => self
                .id
                .trim()
                .parse()
                .map_err(|_| "Id must be a whole number.".to_string())?,
        };

        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required.".to_string());
        }

        let price = Decimal::from_str(self.price.trim())
            .map_err(|_| "Price must be a number.".to_string())?;
        let stock: i64 = self
            .stock
            .trim()
            .parse()
            .map_err(|_| "Stock must be a whole number.".to_string())?;

        Ok(Product::new(id, name, price, stock).with_description(self.description.trim()))
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// Handlers

async fn index() -> Redirect {
    Redirect::to(LIST_PATH)
}

// Product list, consuming any pending flash message
async fn products_index(State(state): State<Arc<WebState>>, jar: CookieJar) -> Response {
    let (id, mut session) = load_session(&jar, &state);

    match state.client.list_products(session.token.as_deref()).await {
        Ok(products) => {
            let flash = session.flash.take();
            if let (Some(_), Some(id)) = (&flash, id) {
                let ttl = session_ttl(&state, session.token.as_deref());
                state.sessions.set(&id, session, ttl);
            }
            render_template(ProductsTemplate { products, flash })
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list products");
            error_view(&e)
        }
    }
}

async fn create_form() -> Response {
    render_template(ProductFormTemplate::create(ProductFormValues::default(), None))
}

async fn create_submit(
    State(state): State<Arc<WebState>>,
    jar: CookieJar,
    Form(form): Form<ProductForm>,
) -> Response {
    let values = form.values();
    let product = match form.parse(None) {
        Ok(product) => product,
        Err(message) => return render_template(ProductFormTemplate::create(values, Some(message))),
    };

    let token = session_token(&jar, &state);
    match state.client.create_product(&product, token.as_deref()).await {
        Ok(created) => {
            tracing::info!(product_id = created.id, "Product created");
            Redirect::to(LIST_PATH).into_response()
        }
        Err(ClientError::Unauthorized) => {
            render_template(ProductFormTemplate::create(values, Some("Unauthorized.".into())))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create product");
            render_template(ProductFormTemplate::create(
                values,
                Some("Failed to create product.".into()),
            ))
        }
    }
}

async fn edit_form(
    State(state): State<Arc<WebState>>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> Response {
    let token = session_token(&jar, &state);
    match state.client.get_product(id, token.as_deref()).await {
        Ok(product) => {
            render_template(ProductFormTemplate::edit(id, (&product).into(), None))
        }
        Err(ClientError::Unauthorized) => error_view(&ClientError::Unauthorized),
        Err(e) => {
            tracing::debug!(product_id = id, error = %e, "Product unavailable for editing");
            error_view(&ClientError::NotFound)
        }
    }
}

async fn edit_submit(
    State(state): State<Arc<WebState>>,
    Path(id): Path<i64>,
    jar: CookieJar,
    Form(form): Form<ProductForm>,
) -> Response {
    let values = form.values();
    let product = match form.parse(Some(id)) {
        Ok(product) => product,
        Err(message) => return render_template(ProductFormTemplate::edit(id, values, Some(message))),
    };

    let token = session_token(&jar, &state);
    match state.client.update_product(&product, token.as_deref()).await {
        Ok(()) => {
            tracing::info!(product_id = id, "Product updated");
            Redirect::to(LIST_PATH).into_response()
        }
        Err(ClientError::Unauthorized) => {
            render_template(ProductFormTemplate::edit(id, values, Some("Unauthorized.".into())))
        }
        Err(e) => {
            tracing::warn!(product_id = id, error = %e, "Failed to update product");
            render_template(ProductFormTemplate::edit(
                id,
                values,
                Some("Failed to update product.".into()),
            ))
        }
    }
}

async fn delete_submit(
    State(state): State<Arc<WebState>>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> Response {
    let (existing, mut session) = load_session(&jar, &state);

    let flash = match state.client.delete_product(id, session.token.as_deref()).await {
        Ok(()) => {
            tracing::info!(product_id = id, "Product deleted");
            return Redirect::to(LIST_PATH).into_response();
        }
        Err(ClientError::Unauthorized) => "Unauthorized.",
        Err(e) => {
            tracing::warn!(product_id = id, error = %e, "Failed to delete product");
            "Failed to delete product."
        }
    };

    session.flash = Some(flash.to_string());
    let jar = save_session(jar, &state, existing, session);
    (jar, Redirect::to(LIST_PATH)).into_response()
}

async fn login_page() -> Response {
    render_template(LoginTemplate {
        username: String::new(),
        error: None,
    })
}

async fn login_submit(
    State(state): State<Arc<WebState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.client.login(&form.username, &form.password).await {
        Ok(token) => {
            // Fresh id on every login; drop whatever the old cookie pointed at
            let jar = match session_id(&jar) {
                Some(old) => {
                    state.sessions.clear(&old);
                    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
                }
                None => jar,
            };

            let session = SessionData {
                token: Some(token),
                flash: None,
            };
            let jar = save_session(jar, &state, None, session);
            tracing::info!(username = %form.username, "Web login succeeded");
            (jar, Redirect::to(LIST_PATH)).into_response()
        }
        Err(e) => {
            tracing::warn!(username = %form.username, error = %e, "Web login failed");
            render_with_status(
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    username: form.username,
                    error: Some("Invalid username or password.".to_string()),
                },
            )
        }
    }
}

async fn logout(State(state): State<Arc<WebState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(id) = session_id(&jar) {
        state.sessions.clear(&id);
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to(LOGIN_PATH))
}
