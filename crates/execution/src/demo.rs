//! In-memory e-commerce catalog backing the built-in schema.
//!
//! Mutations change the in-memory state only; nothing outlives the process.

use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::{ResolveInfo, Resolver};

const CATALOG_JSON: &str = include_str!("../data/catalog.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: String,
    pub in_stock: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemInput {
    product_id: String,
    quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub users: Vec<User>,
    pub orders: Vec<Order>,
    #[serde(skip)]
    next_order_id: u64,
}

impl Catalog {
    /// The bundled sample data.
    pub fn sample() -> Result<Self, serde_json::Error> {
        Self::from_json(CATALOG_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: Catalog = serde_json::from_str(json)?;
        catalog.next_order_id = catalog.orders.len() as u64 + 1;
        Ok(catalog)
    }

    fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn create_order(&mut self, user_id: &str, items: Vec<OrderItemInput>) -> Result<Order, String> {
        if !self.users.iter().any(|u| u.id == user_id) {
            return Err(format!("User {user_id} not found"));
        }

        let mut order_items = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .product(&item.product_id)
                .ok_or_else(|| format!("Product {} not found", item.product_id))?;
            order_items.push(OrderItem {
                product_id: product.id.clone(),
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let total: f64 = order_items
            .iter()
            .map(|i| i.unit_price * i.quantity as f64)
            .sum();

        let order = Order {
            id: format!("order-{}", self.next_order_id),
            user_id: user_id.to_string(),
            items: order_items,
            total_amount: (total * 100.0).round() / 100.0,
            status: "PENDING".to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.next_order_id += 1;
        self.orders.push(order.clone());
        Ok(order)
    }

    fn cancel_order(&mut self, id: &str) -> Result<Order, String> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| format!("Order {id} not found"))?;
        match order.status.as_str() {
            "CANCELLED" => Err(format!("Order {id} is already cancelled")),
            "DELIVERED" => Err("Cannot cancel a delivered order".to_string()),
            _ => {
                order.status = "CANCELLED".to_string();
                Ok(order.clone())
            }
        }
    }

    fn add_product(&mut self, name: &str, price: f64, category_id: &str) -> Result<Product, String> {
        if !self.categories.iter().any(|c| c.id == category_id) {
            return Err(format!("Category {category_id} not found"));
        }
        let product = Product {
            id: format!("prod-{}", self.products.len() + 1),
            name: name.to_string(),
            description: None,
            price,
            category_id: category_id.to_string(),
            in_stock: true,
            image_url: None,
        };
        self.products.push(product.clone());
        Ok(product)
    }
}

/// Resolves the built-in schema's root and relation fields from a [`Catalog`].
pub struct CatalogResolver {
    catalog: Mutex<Catalog>,
}

impl CatalogResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Mutex::new(catalog),
        }
    }

    pub fn sample() -> Result<Self, serde_json::Error> {
        Ok(Self::new(Catalog::sample()?))
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Catalog {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Option<Value>, String> {
    serde_json::to_value(value).map(Some).map_err(|e| e.to_string())
}

fn str_arg<'v>(args: &'v Map<String, Value>, name: &str) -> Result<&'v str, String> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing argument \"{name}\""))
}

fn parent_str<'v>(parent: &'v Value, key: &str) -> &'v str {
    parent.get(key).and_then(Value::as_str).unwrap_or_default()
}

impl Resolver for CatalogResolver {
    fn resolve(
        &self,
        info: &ResolveInfo<'_>,
        parent: &Value,
        args: &Map<String, Value>,
    ) -> Result<Option<Value>, String> {
        let mut catalog = self.catalog.lock().unwrap_or_else(PoisonError::into_inner);

        match (info.parent_type, info.field_name) {
            // ── Queries ───────────────────────────────────────────
            ("Query", "products") => to_json(&catalog.products),
            ("Query", "product") => {
                let id = str_arg(args, "id")?;
                to_json(catalog.product(id))
            }
            ("Query", "orders") => to_json(&catalog.orders),
            ("Query", "order") => {
                let id = str_arg(args, "id")?;
                to_json(catalog.orders.iter().find(|o| o.id == id))
            }
            ("Query", "users") => to_json(&catalog.users),
            ("Query", "user") => {
                let id = str_arg(args, "id")?;
                to_json(catalog.users.iter().find(|u| u.id == id))
            }
            ("Query", "categories") => to_json(&catalog.categories),

            // ── Mutations ─────────────────────────────────────────
            ("Mutation", "createOrder") => {
                let user_id = str_arg(args, "userId")?;
                let items: Vec<OrderItemInput> =
                    serde_json::from_value(args.get("items").cloned().unwrap_or(Value::Null))
                        .map_err(|e| format!("Invalid order items: {e}"))?;
                let order = catalog.create_order(user_id, items)?;
                debug!(order = %order.id, "order created");
                to_json(order)
            }
            ("Mutation", "cancelOrder") => {
                let id = str_arg(args, "id")?;
                to_json(catalog.cancel_order(id)?)
            }
            ("Mutation", "addProduct") => {
                let name = str_arg(args, "name")?;
                let price = args
                    .get("price")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| "Missing argument \"price\"".to_string())?;
                let category_id = str_arg(args, "categoryId")?;
                to_json(catalog.add_product(name, price, category_id)?)
            }

            // ── Relations ─────────────────────────────────────────
            ("Product", "category") => {
                let id = parent_str(parent, "categoryId");
                to_json(catalog.categories.iter().find(|c| c.id == id))
            }
            ("Order", "user") => {
                let id = parent_str(parent, "userId");
                to_json(catalog.users.iter().find(|u| u.id == id))
            }
            ("OrderItem", "product") => {
                let id = parent_str(parent, "productId");
                to_json(catalog.product(id))
            }
            ("User", "orders") => {
                let id = parent_str(parent, "id");
                let orders: Vec<&Order> = catalog.orders.iter().filter(|o| o.user_id == id).collect();
                to_json(orders)
            }
            ("Category", "products") => {
                let id = parent_str(parent, "id");
                let products: Vec<&Product> = catalog
                    .products
                    .iter()
                    .filter(|p| p.category_id == id)
                    .collect();
                to_json(products)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{execute, Response};
    use serde_json::json;

    fn run(resolver: &CatalogResolver, query: &str) -> Response {
        let schema = nlgql_schema::builtin_schema().unwrap();
        let doc = nlgql_schema::validated_document(&schema, query).unwrap();
        execute(&schema, &doc, resolver)
    }

    #[test]
    fn sample_loads() {
        let catalog = Catalog::sample().unwrap();
        assert_eq!(catalog.categories.len(), 4);
        assert_eq!(catalog.products.len(), 8);
        assert_eq!(catalog.users.len(), 3);
        assert_eq!(catalog.orders.len(), 5);
    }

    #[test]
    fn products_with_categories() {
        let resolver = CatalogResolver::sample().unwrap();
        let res = run(&resolver, "{ products { name category { name } } }");
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        let data = res.data.unwrap();
        let products = data["products"].as_array().unwrap();
        assert_eq!(products.len(), 8);
        assert_eq!(
            products[0],
            json!({ "name": "Wireless Headphones", "category": { "name": "Electronics" } })
        );
    }

    #[test]
    fn nested_relations_resolve() {
        let resolver = CatalogResolver::sample().unwrap();
        let res = run(
            &resolver,
            r#"{ user(id: "user-1") { name orders { id items { quantity product { name } } user { email } } } }"#,
        );
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        let data = res.data.unwrap();
        let orders = data["user"]["orders"].as_array().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0]["items"][1]["product"]["name"], "TypeScript Handbook");
        assert_eq!(orders[0]["user"]["email"], "alice@example.com");
    }

    #[test]
    fn missing_entity_is_null() {
        let resolver = CatalogResolver::sample().unwrap();
        let res = run(&resolver, r#"{ product(id: "prod-99") { name } }"#);
        assert_eq!(res.data.unwrap(), json!({ "product": null }));
    }

    #[test]
    fn create_order_prices_from_catalog() {
        let resolver = CatalogResolver::sample().unwrap();
        let res = run(
            &resolver,
            r#"mutation { createOrder(userId: "user-2", items: [{ productId: "prod-7", quantity: 3 }]) { id status totalAmount items { unitPrice } } }"#,
        );
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        let order = &res.data.unwrap()["createOrder"];
        assert_eq!(order["id"], "order-6");
        assert_eq!(order["status"], "PENDING");
        assert_eq!(order["totalAmount"], json!(119.97));
        assert_eq!(order["items"][0]["unitPrice"], json!(39.99));
        assert_eq!(resolver.snapshot().orders.len(), 6);
    }

    #[test]
    fn create_order_unknown_user() {
        let resolver = CatalogResolver::sample().unwrap();
        let res = run(
            &resolver,
            r#"mutation { createOrder(userId: "ghost", items: []) { id } }"#,
        );
        assert_eq!(res.data, Some(Value::Null));
        assert_eq!(res.errors[0].message, "User ghost not found");
    }

    #[test]
    fn cancel_rules() {
        let resolver = CatalogResolver::sample().unwrap();
        let ok = run(&resolver, r#"mutation { cancelOrder(id: "order-4") { status } }"#);
        assert_eq!(ok.data.unwrap()["cancelOrder"]["status"], "CANCELLED");

        let again = run(&resolver, r#"mutation { cancelOrder(id: "order-4") { status } }"#);
        assert_eq!(again.errors[0].message, "Order order-4 is already cancelled");

        let delivered = run(&resolver, r#"mutation { cancelOrder(id: "order-1") { status } }"#);
        assert_eq!(delivered.errors[0].message, "Cannot cancel a delivered order");
    }

    #[test]
    fn add_product_joins_category() {
        let resolver = CatalogResolver::sample().unwrap();
        let res = run(
            &resolver,
            r#"mutation { addProduct(name: "Desk Lamp", price: 24.5, categoryId: "cat-3") { id inStock category { name } } }"#,
        );
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        let product = &res.data.unwrap()["addProduct"];
        assert_eq!(product["id"], "prod-9");
        assert_eq!(product["inStock"], true);
        assert_eq!(product["category"]["name"], "Home & Kitchen");

        let list = run(&resolver, r#"{ categories { name products { name } } }"#);
        let data = list.data.unwrap();
        let kitchen = &data["categories"][2]["products"];
        assert_eq!(kitchen.as_array().unwrap().len(), 3);
    }

    #[test]
    fn add_product_unknown_category() {
        let resolver = CatalogResolver::sample().unwrap();
        let res = run(
            &resolver,
            r#"mutation { addProduct(name: "X", price: 1.0, categoryId: "cat-9") { id } }"#,
        );
        assert_eq!(res.errors[0].message, "Category cat-9 not found");
    }
}
