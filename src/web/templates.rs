// Askama template definitions

use askama::Template;

use crate::db::Product;

/// Raw form field values, echoed back when the form is re-rendered
#[derive(Debug, Clone, Default)]
pub struct ProductFormValues {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
}

impl From<&Product> for ProductFormValues {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
        }
    }
}

// Product list
#[derive(Template)]
#[template(path = "products.html")]
pub struct ProductsTemplate {
    pub products: Vec<Product>,
    pub flash: Option<String>,
}

// Create and edit form
#[derive(Template)]
#[template(path = "product_form.html")]
pub struct ProductFormTemplate {
    pub heading: &'static str,
    pub action: String,
    pub show_id: bool,
    pub form: ProductFormValues,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    pub fn create(form: ProductFormValues, error: Option<String>) -> Self {
        Self {
            heading: "Create product",
            action: "/Products/Create".to_string(),
            show_id: true,
            form,
            error,
        }
    }

    pub fn edit(id: i64, form: ProductFormValues, error: Option<String>) -> Self {
        Self {
            heading: "Edit product",
            action: format!("/Products/Edit/{}", id),
            show_id: false,
            form,
            error,
        }
    }
}

// Login template
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub error: Option<String>,
}

// Error view
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}
