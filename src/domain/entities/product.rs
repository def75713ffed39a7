//! Financial product entity owned by the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of financial product offered by a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    PersonalLoan,
    HomeLoan,
    CarLoan,
    BusinessLoan,
    CreditCard,
    BrokerAccount,
}

impl ProductType {
    pub const ALL: [ProductType; 6] = [
        ProductType::PersonalLoan,
        ProductType::HomeLoan,
        ProductType::CarLoan,
        ProductType::BusinessLoan,
        ProductType::CreditCard,
        ProductType::BrokerAccount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::PersonalLoan => "personal_loan",
            ProductType::HomeLoan => "home_loan",
            ProductType::CarLoan => "car_loan",
            ProductType::BusinessLoan => "business_loan",
            ProductType::CreditCard => "credit_card",
            ProductType::BrokerAccount => "broker_account",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown product type: {0}")]
pub struct UnknownProductType(pub String);

impl FromStr for ProductType {
    type Err = UnknownProductType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownProductType(s.to_string()))
    }
}

/// A product a partner pays commission on.
///
/// `application_url` is the destination a redirect sends the reader to.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub partner_id: String,
    pub name: String,
    pub product_type: ProductType,
    pub application_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input data for registering a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: String,
    pub partner_id: String,
    pub name: String,
    pub product_type: ProductType,
    pub application_url: String,
    pub is_active: bool,
}
