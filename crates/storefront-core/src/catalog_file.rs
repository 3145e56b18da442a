use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One product entry of a seed catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSeed {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    /// Overrides the configured tenant when present.
    #[serde(default)]
    pub tenant: Option<String>,
    pub products: Vec<ProductSeed>,
}

/// Load and validate a seed catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog_file(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CatalogFileParse)?;

    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    if let Some(tenant) = &catalog.tenant {
        if tenant.trim().is_empty() {
            return Err(ConfigError::CatalogValidation(
                "tenant must be non-empty when set".to_string(),
            ));
        }
    }

    let mut seen_codes = HashSet::new();
    for product in &catalog.products {
        if product.code.trim().is_empty() {
            return Err(ConfigError::CatalogValidation(
                "product code must be non-empty".to_string(),
            ));
        }
        if product.name.trim().is_empty() {
            return Err(ConfigError::CatalogValidation(format!(
                "product '{}' has an empty name",
                product.code
            )));
        }
        if product.price.is_sign_negative() && !product.price.is_zero() {
            return Err(ConfigError::CatalogValidation(format!(
                "product '{}' has negative price {}",
                product.code, product.price
            )));
        }
        if !seen_codes.insert(product.code.trim().to_string()) {
            return Err(ConfigError::CatalogValidation(format!(
                "duplicate product code: '{}'",
                product.code
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> CatalogFile {
        serde_yaml::from_str(yaml).expect("valid yaml")
    }

    #[test]
    fn parses_minimal_catalog() {
        let catalog = parse(
            r#"
products:
  - code: CBL-1
    name: USB-C cable
    price: "9.99"
    category: Cables
  - code: SPK-1
    name: Bookshelf speaker
    price: 120
"#,
        );
        validate_catalog(&catalog).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[0].price.to_string(), "9.99");
        assert!(catalog.products[1].category.is_none());
    }

    #[test]
    fn rejects_duplicate_codes() {
        let catalog = parse(
            r"
products:
  - { code: A, name: One, price: 1 }
  - { code: A, name: Two, price: 2 }
",
        );
        let err = validate_catalog(&catalog).unwrap_err();
        assert!(err.to_string().contains("duplicate product code"));
    }

    #[test]
    fn rejects_negative_price() {
        let catalog = parse(
            r"
products:
  - { code: A, name: One, price: -1 }
",
        );
        let err = validate_catalog(&catalog).unwrap_err();
        assert!(err.to_string().contains("negative price"));
    }

    #[test]
    fn rejects_empty_name() {
        let catalog = parse(
            r#"
products:
  - { code: A, name: "  ", price: 1 }
"#,
        );
        assert!(validate_catalog(&catalog).is_err());
    }

    #[test]
    fn rejects_blank_tenant() {
        let catalog = parse(
            r#"
tenant: " "
products: []
"#,
        );
        assert!(validate_catalog(&catalog).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_catalog_file(Path::new("/nonexistent/catalog.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CatalogFileIo { .. }));
    }
}
