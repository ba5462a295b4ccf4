use serde::{Deserialize, Serialize};

/// A pizza on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PizzaSpecial {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub base_price: f64,
}

/// Payload for adding a special to the menu.
#[derive(Debug, Clone)]
pub struct SpecialCreate {
    pub name: String,
    pub description: String,
    pub base_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topping {
    pub id: u32,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct ToppingCreate {
    pub name: String,
    pub price: f64,
}
