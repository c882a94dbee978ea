//! Input validation for product payloads.

use rust_decimal::Decimal;

use super::error::{ApiError, ValidationErrorBuilder};
use crate::db::Product;

/// Longest accepted product name
const MAX_NAME_LEN: usize = 200;

/// Longest accepted product description
const MAX_DESCRIPTION_LEN: usize = 4000;

pub fn validate_product(product: &Product) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if product.name.trim().is_empty() {
        errors.add("name", "Name is required");
    } else if product.name.chars().count() > MAX_NAME_LEN {
        errors.add(
            "name",
            format!("Name is too long (max {} characters)", MAX_NAME_LEN),
        );
    }

    if product.description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.add(
            "description",
            format!(
                "Description is too long (max {} characters)",
                MAX_DESCRIPTION_LEN
            ),
        );
    }

    if product.price < Decimal::ZERO {
        errors.add("price", "Price must not be negative");
    }

    if product.stock < 0 {
        errors.add("stock", "Stock must not be negative");
    }

    if product.id < 0 {
        errors.add("id", "Id must not be negative");
    }

    errors.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;

    #[test]
    fn test_valid_product() {
        let product = Product::new(1, "Laptop", Decimal::new(100099, 2), 10);
        assert!(validate_product(&product).is_ok());
    }

    #[test]
    fn test_zero_price_and_stock_allowed() {
        let product = Product::new(0, "Freebie", Decimal::ZERO, 0);
        assert!(validate_product(&product).is_ok());
    }

    #[test]
    fn test_negative_values_rejected() {
        let product = Product::new(1, "Laptop", Decimal::new(-1, 0), -5);
        let err = validate_product(&product).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_blank_name_rejected() {
        let product = Product::new(1, "   ", Decimal::ONE, 1);
        assert!(validate_product(&product).is_err());
    }

    #[test]
    fn test_long_name_rejected() {
        let product = Product::new(1, "x".repeat(201), Decimal::ONE, 1);
        assert!(validate_product(&product).is_err());
    }
}
