use crate::utils::error::{CartError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CartError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Endpoints rendered into markup are usually site-relative (`/cart/remove_product/`),
/// so they are joined onto `base` when one is configured.
pub fn resolve_endpoint(field_name: &str, base: Option<&Url>, raw: &str) -> Result<Url> {
    validate_non_empty_string(field_name, raw)?;

    match Url::parse(raw) {
        Ok(url) => {
            validate_url(field_name, url.as_str())?;
            Ok(url)
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| CartError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: raw.to_string(),
                reason: "Relative endpoint requires client.base_url".to_string(),
            })?;
            base.join(raw).map_err(|e| CartError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: raw.to_string(),
                reason: format!("Cannot join onto {}: {}", base, e),
            })
        }
        Err(e) => Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Expected one of: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| CartError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("client.base_url", "https://shop.example.com").is_ok());
        assert!(validate_url("client.base_url", "http://localhost:8000").is_ok());
        assert!(validate_url("client.base_url", "").is_err());
        assert!(validate_url("client.base_url", "invalid-url").is_err());
        assert!(validate_url("client.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_resolve_relative_endpoint() {
        let base = Url::parse("http://shop.example.com/").unwrap();
        let url = resolve_endpoint("endpoints.remove", Some(&base), "/cart/remove_product/").unwrap();
        assert_eq!(url.as_str(), "http://shop.example.com/cart/remove_product/");
    }

    #[test]
    fn test_resolve_relative_endpoint_without_base() {
        let err = resolve_endpoint("endpoints.update", None, "/cart/update_quantity/").unwrap_err();
        assert!(matches!(err, CartError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_absolute_endpoint_ignores_base() {
        let base = Url::parse("http://shop.example.com/").unwrap();
        let url = resolve_endpoint("href", Some(&base), "https://other.example.com/remind/").unwrap();
        assert_eq!(url.host_str(), Some("other.example.com"));
        assert!(resolve_endpoint("href", Some(&base), "mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("logging.format", "json", &["compact", "json"]).is_ok());
        assert!(validate_one_of("logging.format", "xml", &["compact", "json"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("cart.line_hide_ms", 600u64, 0, 10_000).is_ok());
        assert!(validate_range("cart.line_hide_ms", 60_000u64, 0, 10_000).is_err());
    }
}
