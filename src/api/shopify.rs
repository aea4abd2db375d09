//! Shopify Admin GraphQL integration.
//!
//! The five operations the reorderer needs, each with its own typed wire
//! schema. We only deserialize the fields we use; anything outside the
//! expected shape surfaces as a `Schema` error instead of a silent
//! default.
//!
//! Auth: `X-Shopify-Access-Token` header, handled by the transport.
//! Endpoint: `https://{store}/admin/api/{version}/graphql.json`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::GqlClient;
use super::{CatalogApi, Page};
use crate::config::ApiCredentials;
use crate::types::{
    Collection, CuratorError, InventoryLevel, JobHandle, Move, Product, SortOrder, Variant,
};

/// Collections fetched per page (API max for this connection is 250).
const COLLECTIONS_PER_PAGE: u32 = 100;

// ---------------------------------------------------------------------------
// Operation documents
// ---------------------------------------------------------------------------

const LIST_COLLECTIONS: &str = r#"
query ListCollections($first: Int!, $cursor: String) {
  collections(first: $first, after: $cursor) {
    pageInfo { hasNextPage endCursor }
    nodes {
      id
      title
      handle
      sortOrder
      ruleSet { rules { column relation condition } }
    }
  }
}"#;

const COLLECTION_PRODUCTS: &str = r#"
query CollectionProducts($id: ID!, $cursor: String, $perPage: Int!, $invLevels: Int!) {
  collection(id: $id) {
    id
    products(first: $perPage, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        id
        title
        productType
        tags
        variants(first: 100) {
          nodes {
            id
            inventoryItem {
              inventoryLevels(first: $invLevels) {
                nodes {
                  location { id }
                  quantities(names: ["available"]) { name quantity }
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

const COLLECTION_UPDATE_SORT: &str = r#"
mutation UpdateCollectionSort($id: ID!) {
  collectionUpdate(input: { id: $id, sortOrder: MANUAL }) {
    collection { id sortOrder }
    userErrors { field message }
  }
}"#;

const COLLECTION_REORDER: &str = r#"
mutation ReorderProducts($collectionId: ID!, $moves: [MoveInput!]!) {
  collectionReorderProducts(id: $collectionId, moves: $moves) {
    job { id }
    userErrors { field message }
  }
}"#;

const JOB_QUERY: &str = r#"
query Job($id: ID!) {
  job(id: $id) { id done }
}"#;

// ---------------------------------------------------------------------------
// Wire schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePageInfo {
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

/// A paginated connection (`pageInfo` + `nodes`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    page_info: WirePageInfo,
    nodes: Vec<T>,
}

impl<T> Connection<T> {
    fn into_page<U>(self, convert: impl FnMut(T) -> U) -> Page<U> {
        Page {
            nodes: self.nodes.into_iter().map(convert).collect(),
            has_next_page: self.page_info.has_next_page,
            end_cursor: self.page_info.end_cursor,
        }
    }
}

/// A connection fetched without page info (bounded sub-lists such as a
/// product's variants).
#[derive(Debug, Deserialize)]
struct NodeList<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<T>,
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct CollectionsData {
    collections: Connection<CollectionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionNode {
    id: String,
    title: String,
    handle: String,
    sort_order: SortOrder,
    /// Present iff the collection is rule-derived ("smart").
    #[serde(default)]
    rule_set: Option<serde_json::Value>,
}

impl CollectionNode {
    fn into_collection(self) -> Collection {
        let is_smart = self.rule_set.is_some();
        Collection {
            id: self.id,
            title: self.title,
            handle: self.handle,
            sort_order: self.sort_order,
            is_smart,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    /// `null` when the collection no longer exists.
    collection: Option<ProductsCollection>,
}

#[derive(Debug, Deserialize)]
struct ProductsCollection {
    products: Connection<ProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: String,
    title: String,
    #[serde(default)]
    product_type: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    variants: NodeList<VariantNode>,
}

impl ProductNode {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            title: self.title,
            product_type: self.product_type,
            tags: self.tags,
            variants: self
                .variants
                .nodes
                .into_iter()
                .map(VariantNode::into_variant)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    id: String,
    #[serde(default)]
    inventory_item: Option<InventoryItemNode>,
}

impl VariantNode {
    fn into_variant(self) -> Variant {
        let levels = self
            .inventory_item
            .map(|item| item.inventory_levels.nodes)
            .unwrap_or_default();
        Variant {
            id: self.id,
            inventory_levels: levels.into_iter().map(LevelNode::into_level).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryItemNode {
    #[serde(default)]
    inventory_levels: NodeList<LevelNode>,
}

#[derive(Debug, Deserialize)]
struct LevelNode {
    #[serde(default)]
    location: Option<LocationRef>,
    #[serde(default)]
    quantities: Vec<QuantityEntry>,
}

impl LevelNode {
    fn into_level(self) -> InventoryLevel {
        // The query asks for the "available" quantity by name; keep the
        // name check in case the API ever returns siblings.
        let available = self
            .quantities
            .iter()
            .find(|q| q.name == "available")
            .map(|q| q.quantity)
            .unwrap_or(0);
        InventoryLevel {
            location_id: self.location.map(|l| l.id),
            available,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocationRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct QuantityEntry {
    name: String,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionUpdateData {
    collection_update: Option<MutationPayload<IgnoredCollection>>,
}

#[derive(Debug, Default, Deserialize)]
struct IgnoredCollection {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderData {
    collection_reorder_products: Option<ReorderPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderPayload {
    #[serde(default)]
    job: Option<JobNode>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct JobNode {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationPayload<T> {
    #[serde(default)]
    #[allow(dead_code)]
    collection: Option<T>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct UserError {
    #[serde(default)]
    field: Option<serde_json::Value>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JobData {
    job: Option<JobStatusNode>,
}

#[derive(Debug, Deserialize)]
struct JobStatusNode {
    #[allow(dead_code)]
    id: String,
    done: bool,
}

/// Wire form of a move. The position is an unsigned-64 on the platform's
/// side and travels as a string in JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveInput {
    id: String,
    new_position: String,
}

impl From<&Move> for MoveInput {
    fn from(m: &Move) -> Self {
        Self {
            id: m.id.clone(),
            new_position: m.new_position.to_string(),
        }
    }
}

/// Join mutation user-errors into one message for the error value.
fn user_error_message(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) => format!("{field}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Shopify Admin API client implementing `CatalogApi`.
pub struct ShopifyAdmin {
    gql: GqlClient,
    products_per_page: u32,
    inventory_levels_per_variant: u32,
}

impl ShopifyAdmin {
    pub fn new(
        creds: &ApiCredentials,
        products_per_page: u32,
        inventory_levels_per_variant: u32,
    ) -> Result<Self, CuratorError> {
        Ok(Self {
            gql: GqlClient::new(creds)?,
            products_per_page,
            inventory_levels_per_variant,
        })
    }
}

#[async_trait]
impl CatalogApi for ShopifyAdmin {
    async fn collections_page(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<Collection>, CuratorError> {
        let data: CollectionsData = self
            .gql
            .execute(
                "ListCollections",
                LIST_COLLECTIONS,
                serde_json::json!({ "first": COLLECTIONS_PER_PAGE, "cursor": cursor }),
            )
            .await?;
        Ok(data.collections.into_page(CollectionNode::into_collection))
    }

    async fn products_page(
        &self,
        collection_id: &str,
        cursor: Option<String>,
    ) -> Result<Option<Page<Product>>, CuratorError> {
        let data: ProductsData = self
            .gql
            .execute(
                "CollectionProducts",
                COLLECTION_PRODUCTS,
                serde_json::json!({
                    "id": collection_id,
                    "cursor": cursor,
                    "perPage": self.products_per_page,
                    "invLevels": self.inventory_levels_per_variant,
                }),
            )
            .await?;
        Ok(data
            .collection
            .map(|col| col.products.into_page(ProductNode::into_product)))
    }

    async fn set_manual_sort(&self, collection_id: &str) -> Result<(), CuratorError> {
        let data: CollectionUpdateData = self
            .gql
            .execute(
                "UpdateCollectionSort",
                COLLECTION_UPDATE_SORT,
                serde_json::json!({ "id": collection_id }),
            )
            .await?;

        let payload = data.collection_update.ok_or_else(|| {
            CuratorError::Schema("UpdateCollectionSort: missing mutation payload".to_string())
        })?;
        if !payload.user_errors.is_empty() {
            return Err(CuratorError::RemoteOperation {
                operation: "collectionUpdate".to_string(),
                message: user_error_message(&payload.user_errors),
            });
        }
        debug!(collection_id, "Sort mode set to MANUAL");
        Ok(())
    }

    async fn submit_reorder(
        &self,
        collection_id: &str,
        moves: &[Move],
    ) -> Result<Option<JobHandle>, CuratorError> {
        let wire_moves: Vec<MoveInput> = moves.iter().map(MoveInput::from).collect();
        let data: ReorderData = self
            .gql
            .execute(
                "ReorderProducts",
                COLLECTION_REORDER,
                serde_json::json!({ "collectionId": collection_id, "moves": wire_moves }),
            )
            .await?;

        let payload = data.collection_reorder_products.ok_or_else(|| {
            CuratorError::Schema("ReorderProducts: missing mutation payload".to_string())
        })?;
        if !payload.user_errors.is_empty() {
            return Err(CuratorError::RemoteOperation {
                operation: "collectionReorderProducts".to_string(),
                message: user_error_message(&payload.user_errors),
            });
        }
        Ok(payload.job.map(|j| JobHandle { id: j.id }))
    }

    async fn job_done(&self, job_id: &str) -> Result<bool, CuratorError> {
        let data: JobData = self
            .gql
            .execute("Job", JOB_QUERY, serde_json::json!({ "id": job_id }))
            .await?;
        // A job the platform no longer reports is as finished as it gets.
        Ok(data.job.map(|j| j.done).unwrap_or(true))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
