use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_auth::OwnedResource;
use stockroom_core::{AccountId, Entity, FieldViolation, ProductId, ValidationErrors};

pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const PRICE_MIN: f64 = 0.0;
pub const PRICE_MAX: f64 = 999_999.99;

/// A catalog entry owned by the account that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Owner; set from the authenticated caller at creation and never changed.
    pub user_created: AccountId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(draft: ProductDraft, owner: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::new(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            user_created: owner,
            created_at: now,
            updated_at: None,
        }
    }

    /// Apply a validated patch: only supplied fields change, `updated_at` is always set.
    pub fn apply_patch(&mut self, patch: &ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        self.updated_at = Some(now);
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl OwnedResource for Product {
    fn owner(&self) -> AccountId {
        self.user_created
    }
}

/// Create request body. Every field is optional at the wire level so that a
/// missing field is reported as a field violation rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
}

impl NewProduct {
    pub fn validate(self) -> Result<ProductDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.is_none() {
            errors.push(FieldViolation::required("name"));
        }
        if let Some(name) = self.name.as_deref() {
            check_name(name, &mut errors);
        }
        if let Some(description) = self.description.as_deref() {
            check_description(description, &mut errors);
        }
        match self.price {
            None => errors.push(FieldViolation::required("price")),
            Some(price) => check_price(price, &mut errors),
        }

        match (self.name, self.price) {
            (Some(name), Some(price)) if errors.is_empty() => Ok(ProductDraft {
                name,
                description: self.description,
                price,
            }),
            _ => Err(errors),
        }
    }
}

/// Partial update body; absent (or null) fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = self.name.as_deref() {
            check_name(name, &mut errors);
        }
        if let Some(description) = self.description.as_deref() {
            check_description(description, &mut errors);
        }
        if let Some(price) = self.price {
            check_price(price, &mut errors);
        }
        errors.into_result()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none()
    }
}

fn check_name(name: &str, errors: &mut ValidationErrors) {
    let len = name.chars().count();
    if len == 0 {
        errors.push(FieldViolation::too_short("name", 1));
    } else if len > NAME_MAX_CHARS {
        errors.push(FieldViolation::too_long("name", NAME_MAX_CHARS));
    }
}

fn check_description(description: &str, errors: &mut ValidationErrors) {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push(FieldViolation::too_long("description", DESCRIPTION_MAX_CHARS));
    }
}

fn check_price(price: f64, errors: &mut ValidationErrors) {
    if !price.is_finite() {
        errors.push(FieldViolation::invalid("price", "value is not a valid number"));
    } else if price < PRICE_MIN {
        errors.push(FieldViolation::less_than("price", PRICE_MIN));
    } else if price > PRICE_MAX {
        errors.push(FieldViolation::greater_than("price", PRICE_MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_product(name: Option<&str>, description: Option<&str>, price: Option<f64>) -> NewProduct {
        NewProduct {
            name: name.map(Into::into),
            description: description.map(Into::into),
            price,
        }
    }

    fn kinds(errors: &ValidationErrors) -> Vec<(&str, &str)> {
        errors
            .violations()
            .iter()
            .map(|v| (v.loc[1].as_str(), v.kind.as_str()))
            .collect()
    }

    fn laptop(owner: AccountId) -> Product {
        let draft = new_product(Some("Laptop Gaming"), Some("RTX 4060"), Some(1299.99))
            .validate()
            .unwrap();
        Product::new(draft, owner, Utc::now())
    }

    #[test]
    fn valid_create_becomes_an_owned_product() {
        let owner = AccountId::new();
        let product = laptop(owner);

        assert_eq!(product.name, "Laptop Gaming");
        assert_eq!(product.description.as_deref(), Some("RTX 4060"));
        assert_eq!(product.price, 1299.99);
        assert_eq!(product.owner(), owner);
        assert_eq!(product.updated_at, None);
    }

    #[test]
    fn description_is_optional() {
        let draft = new_product(Some("Mouse"), None, Some(0.0)).validate().unwrap();
        assert_eq!(draft.description, None);
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let errors = NewProduct::default().validate().unwrap_err();
        assert_eq!(kinds(&errors), vec![("name", "missing"), ("price", "missing")]);
    }

    #[test]
    fn bounds_are_enforced() {
        let errors = new_product(Some(""), Some(&"d".repeat(501)), Some(-1.0))
            .validate()
            .unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ("name", "string_too_short"),
                ("description", "string_too_long"),
                ("price", "greater_than_equal"),
            ]
        );

        let errors = new_product(Some(&"n".repeat(101)), None, Some(1_000_000.0))
            .validate()
            .unwrap_err();
        assert_eq!(kinds(&errors), vec![("name", "string_too_long"), ("price", "less_than_equal")]);
    }

    #[test]
    fn boundary_values_are_accepted() {
        let draft = new_product(Some(&"n".repeat(100)), Some(&"d".repeat(500)), Some(PRICE_MAX))
            .validate()
            .unwrap();
        assert_eq!(draft.price, PRICE_MAX);
    }

    #[test]
    fn patch_changes_only_supplied_fields() {
        let mut product = laptop(AccountId::new());
        let before = product.clone();
        let later = before.created_at + Duration::minutes(5);

        let patch = ProductPatch {
            price: Some(1199.99),
            ..ProductPatch::default()
        };
        patch.validate().unwrap();
        product.apply_patch(&patch, later);

        assert_eq!(product.price, 1199.99);
        assert_eq!(product.name, before.name);
        assert_eq!(product.description, before.description);
        assert_eq!(product.user_created, before.user_created);
        assert_eq!(product.created_at, before.created_at);
        assert_eq!(product.updated_at, Some(later));
    }

    #[test]
    fn empty_patch_still_touches_updated_at() {
        let mut product = laptop(AccountId::new());
        let patch = ProductPatch::default();
        assert!(patch.is_empty());

        let now = Utc::now();
        product.apply_patch(&patch, now);
        assert_eq!(product.updated_at, Some(now));
    }

    #[test]
    fn patch_validation_uses_the_same_bounds() {
        let patch = ProductPatch {
            name: Some(String::new()),
            price: Some(-0.01),
            ..ProductPatch::default()
        };
        let errors = patch.validate().unwrap_err();
        assert_eq!(kinds(&errors), vec![("name", "string_too_short"), ("price", "greater_than_equal")]);
    }

    #[test]
    fn patch_body_treats_null_as_absent() {
        let patch: ProductPatch =
            serde_json::from_value(serde_json::json!({ "name": null, "price": 5.0 })).unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.price, Some(5.0));
    }

    #[test]
    fn serialized_product_exposes_the_owner_field() {
        let owner = AccountId::new();
        let json = serde_json::to_value(laptop(owner)).unwrap();
        assert_eq!(json["user_created"], serde_json::json!(owner.to_string()));
        assert_eq!(json["updated_at"], serde_json::Value::Null);
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

            /// Property: a create is accepted iff every field is within bounds.
            #[test]
            fn create_accepts_exactly_the_bounded_inputs(
                name in ".{0,120}",
                price in -10.0f64..1_100_000.0,
            ) {
                let name_ok = (1..=NAME_MAX_CHARS).contains(&name.chars().count());
                let price_ok = (PRICE_MIN..=PRICE_MAX).contains(&price);
                let result = new_product(Some(&name), None, Some(price)).validate();
                prop_assert_eq!(result.is_ok(), name_ok && price_ok);
            }

            /// Property: applying a patch never changes identity or ownership.
            #[test]
            fn patch_preserves_identity(name in "[a-z]{1,20}", price in 0.0f64..1000.0) {
                let mut product = laptop(AccountId::new());
                let (id, owner, created_at) = (product.id, product.user_created, product.created_at);
                let patch = ProductPatch { name: Some(name.clone()), description: None, price: Some(price) };
                product.apply_patch(&patch, Utc::now());

                prop_assert_eq!(product.id, id);
                prop_assert_eq!(product.user_created, owner);
                prop_assert_eq!(product.created_at, created_at);
                prop_assert_eq!(product.name, name);
            }
        }
    }
}
