// src/services/idgen.rs

//! Item id allocation.

use log::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::stores::ItemStore;

/// Allocate a source-prefixed item id that is not yet taken, live or
/// archived. Collisions are vanishingly rare but checked anyway since ids
/// end up in public URLs.
pub async fn generate_item_id(store: &dyn ItemStore, source: &str) -> Result<String> {
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let item_id = format!("{}-{}", source.to_lowercase(), &suffix[..30]);
        debug!("Generated item_id={item_id}");
        if !store.exists(&item_id).await? {
            return Ok(item_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;

    #[tokio::test]
    async fn test_id_shape_and_uniqueness() {
        let store = MemoryStore::new();
        let a = generate_item_id(&store, "Blocket").await.unwrap();
        let b = generate_item_id(&store, "Blocket").await.unwrap();

        assert!(a.starts_with("blocket-"));
        assert_eq!(a.len(), "blocket-".len() + 30);
        assert_ne!(a, b);
    }
}
