//! End-to-end tests of the inventory engine.
//!
//! Most tests run the engine over the in-memory store with a stepping clock,
//! so every write lands one minute after the previous one.
//!
//! The tests marked `#[ignore]` run against DynamoDB. They need a reachable
//! endpoint and credentials in your `.env` file:
//!
//! ```text
//! AWS_ACCESS_KEY_ID=your_access_key
//! AWS_SECRET_ACCESS_KEY=your_secret_key
//! AWS_REGION=your_preferred_region
//! ```
//!
//! For DynamoDB Local, dummy credentials work together with:
//!
//! ```text
//! AWS_ENDPOINT_URL=http://localhost:8000
//! ```
//!
//! Run them with `cargo test -- --ignored`. Against real AWS they may incur
//! charges.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::dynamodb::DynamoDb;
use crate::inventory::{
    Category, DateRange, DynamoStore, Filters, InventoryEngine, ItemKey, MemoryStore, NewItem,
    Pagination, PriceRange, Query, Sort, SortField, SortOrder,
};

const TEST_TABLE_NAME: &str = "test-inventory";

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
}

/// Clock that advances one minute per call, starting at [`start`].
fn stepping_clock() -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
    let ticks = Arc::new(AtomicI64::new(0));
    move || start() + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst))
}

fn engine() -> InventoryEngine {
    InventoryEngine::new(Arc::new(MemoryStore::new())).with_clock(stepping_clock())
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn new_item(name: &str, category: Category, price: &str) -> NewItem {
    NewItem::new(name, category, dec(price)).unwrap()
}

async fn seed(engine: &InventoryEngine, items: &[(&str, Category, &str)]) -> Result<()> {
    for (name, category, price) in items {
        engine.upsert(new_item(name, *category, price)).await?;
    }
    Ok(())
}

#[tokio::test]
async fn upserting_same_key_keeps_one_record_with_latest_price() -> Result<()> {
    let engine = engine();
    let first = engine
        .upsert(new_item("Pen", Category::Stationary, "1.5"))
        .await?;
    let second = engine
        .upsert(new_item("Pen", Category::Stationary, "2.0"))
        .await?;

    let all = engine.query(&Query::default()).await?;
    assert_eq!(all.total, 1);
    assert_eq!(all.items[0].price, dec("2"));
    assert_eq!(all.items[0].id, first.id);
    assert!(second.last_updated_dt > first.last_updated_dt);
    Ok(())
}

#[tokio::test]
async fn deleting_missing_record_succeeds() -> Result<()> {
    let engine = engine();
    engine
        .delete(&ItemKey::new("Nothing", Category::Books))
        .await?;

    seed(&engine, &[("Atlas", Category::Books, "30.0")]).await?;
    let key = ItemKey::new("Atlas", Category::Books);
    engine.delete(&key).await?;
    engine.delete(&key).await?;
    assert_eq!(engine.query(&Query::default()).await?.total, 0);
    Ok(())
}

#[tokio::test]
async fn page_size_bounds_unfiltered_results() -> Result<()> {
    let engine = engine();
    for i in 1..=7 {
        engine
            .upsert(NewItem::new(format!("item {i}"), Category::Home, Decimal::from(i))?)
            .await?;
    }

    for limit in [1, 5, 7, 20] {
        let query = Query {
            pagination: Some(Pagination::new(1, limit)),
            ..Default::default()
        };
        let page = engine.query(&query).await?;
        assert_eq!(page.count, (limit as usize).min(7));
        assert_eq!(page.total, 7);
    }
    Ok(())
}

#[tokio::test]
async fn category_query_sorted_by_price() -> Result<()> {
    let engine = engine();
    seed(
        &engine,
        &[
            ("Notebook", Category::Stationary, "5.0"),
            ("Pen", Category::Stationary, "1.0"),
            ("Ruler", Category::Stationary, "3.0"),
            ("Vinyl", Category::Music, "2.0"),
        ],
    )
    .await?;

    let query: Query = serde_json::from_str(
        r#"{"filters":{"category":"Stationary"},"pagination":{"page":1,"limit":10},"sort":{"field":"price","order":"asc"}}"#,
    )?;
    let page = engine.query(&query).await?;
    let prices: Vec<Decimal> = page.items.iter().map(|i| i.price).collect();
    assert_eq!(prices, vec![dec("1"), dec("3"), dec("5")]);
    Ok(())
}

#[tokio::test]
async fn default_order_is_most_recently_updated_first() -> Result<()> {
    let engine = engine();
    seed(
        &engine,
        &[
            ("item 1", Category::Music, "25.0"),
            ("item 2", Category::Music, "20.0"),
            ("item 3", Category::Music, "15.0"),
        ],
    )
    .await?;
    // Touch item 1 again so it becomes the newest.
    engine
        .upsert(new_item("item 1", Category::Music, "26.0"))
        .await?;

    let page = engine.query(&Query::default()).await?;
    let names: Vec<&str> = page.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["item 1", "item 3", "item 2"]);
    Ok(())
}

#[tokio::test]
async fn combined_filters_are_a_conjunction() -> Result<()> {
    let engine = engine();
    for category in [Category::Music, Category::Books, Category::Beauty] {
        for (i, price) in [(1, "25"), (2, "20"), (3, "15")] {
            engine
                .upsert(new_item(&format!("item {i}"), category, price))
                .await?;
        }
    }

    let by_name = Query {
        filters: Filters {
            name: Some("ITEM 1".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(engine.query(&by_name).await?.total, 3);

    let by_price = Query {
        filters: Filters {
            price_range: Some(PriceRange::new(dec("1"), dec("19"))),
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(engine.query(&by_price).await?.total, 3);

    let all_three = Query {
        filters: Filters {
            name: Some("item".into()),
            category: Some("books".into()),
            price_range: Some(PriceRange::new(dec("16"), dec("25"))),
        },
        sort: Sort::new(SortField::Price, SortOrder::Desc),
        ..Default::default()
    };
    let page = engine.query(&all_three).await?;
    let names: Vec<&str> = page.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["item 1", "item 2"]);
    Ok(())
}

#[tokio::test]
async fn pages_cover_result_set_without_overlap() -> Result<()> {
    let engine = engine();
    for i in 0..10 {
        // Only two distinct prices, so most ordering comes from the tie-break.
        let price = if i % 2 == 0 { "4" } else { "8" };
        engine
            .upsert(new_item(&format!("p{i}"), Category::Grocery, price))
            .await?;
    }

    let mut seen = Vec::new();
    for page in 1..=4 {
        let query = Query {
            pagination: Some(Pagination::new(page, 3)),
            sort: Sort::new(SortField::Price, SortOrder::Asc),
            ..Default::default()
        };
        seen.extend(
            engine
                .query(&query)
                .await?
                .items
                .into_iter()
                .map(|i| i.name),
        );
    }
    assert_eq!(
        seen,
        vec!["p0", "p2", "p4", "p6", "p8", "p1", "p3", "p5", "p7", "p9"]
    );
    Ok(())
}

#[tokio::test]
async fn aggregate_all_matches_per_category_sums() -> Result<()> {
    let engine = engine();
    seed(
        &engine,
        &[
            ("Lipstick", Category::Beauty, "12.5"),
            ("Vinyl", Category::Music, "20.25"),
            ("Drum", Category::Music, "80.0"),
            ("Kettle", Category::Electrics, "35.75"),
        ],
    )
    .await?;

    let all = engine.aggregate("all").await?;
    let mut per_category_sum = Decimal::ZERO;
    let mut per_category_count = 0;
    for group in &all.groups {
        let single = engine.aggregate(group.category.as_str()).await?;
        assert_eq!(single.groups.len(), 1);
        assert_eq!(&single.groups[0], group);
        per_category_sum += single.total_price;
        per_category_count += single.count;
    }
    assert_eq!(all.groups.len(), 3);
    assert_eq!(all.total_price, per_category_sum);
    assert_eq!(all.count, per_category_count);
    assert_eq!(all.total_price, dec("148.5"));
    Ok(())
}

#[tokio::test]
async fn aggregate_of_unknown_label_is_empty() -> Result<()> {
    let engine = engine();
    seed(&engine, &[("Vinyl", Category::Music, "20.0")]).await?;
    let report = engine.aggregate("Toys").await?;
    assert!(report.groups.is_empty());
    assert_eq!(report.count, 0);
    Ok(())
}

#[tokio::test]
async fn date_range_is_inclusive_and_sums_prices() -> Result<()> {
    let engine = engine();
    // Written at start + 0, 1, 2, 3 minutes.
    seed(
        &engine,
        &[
            ("old", Category::Home, "10.0"),
            ("target_product_1", Category::Home, "40.0"),
            ("target_product_2", Category::Books, "60.0"),
            ("new", Category::Home, "5.0"),
        ],
    )
    .await?;

    let range = DateRange::new(start() + Duration::minutes(1), start() + Duration::minutes(2))?;
    let report = engine.filter_by_date_range(&range).await?;
    let names: Vec<&str> = report.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["target_product_1", "target_product_2"]);
    assert_eq!(report.total_price, dec("100"));
    Ok(())
}

#[tokio::test]
async fn price_totals_do_not_drift() -> Result<()> {
    let engine = engine();
    seed(
        &engine,
        &[("Gum", Category::Grocery, "0.1"), ("Mint", Category::Grocery, "0.2")],
    )
    .await?;

    let totals = engine.aggregate("all").await?;
    assert_eq!(totals.total_price, dec("0.3"));
    assert_eq!(totals.groups[0].total_price, dec("0.3"));

    let range = DateRange::new(start(), start() + Duration::minutes(1))?;
    let report = engine.filter_by_date_range(&range).await?;
    assert_eq!(report.total_price, dec("0.3"));
    Ok(())
}

#[tokio::test]
async fn blank_category_and_name_filters_are_ignored() -> Result<()> {
    let engine = engine();
    seed(&engine, &[("Vinyl", Category::Music, "20")]).await?;

    let query: Query =
        serde_json::from_str(r#"{"filters":{"category":"","name":"","price_range":[]}}"#)?;
    let page = engine.query(&query).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Vinyl");
    Ok(())
}

#[tokio::test]
async fn concurrent_upserts_of_one_key_leave_one_record() -> Result<()> {
    let engine = InventoryEngine::new(Arc::new(MemoryStore::new()));
    let mut handles = Vec::new();
    for i in 1..=16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .upsert(NewItem::new("Lamp", Category::Home, Decimal::from(i))?)
                .await
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??.id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let page = engine.query(&Query::default()).await?;
    assert_eq!(page.total, 1);
    Ok(())
}

// --- DynamoDB ---

async fn dynamo_engine() -> Result<InventoryEngine> {
    dotenv::dotenv().ok();
    let sdk_config = aws_config::load_from_env().await;
    let store = DynamoStore::new(DynamoDb::new(&sdk_config), TEST_TABLE_NAME);
    store.bootstrap().await?;
    Ok(InventoryEngine::new(Arc::new(store)))
}

#[tokio::test]
#[ignore = "requires DynamoDB"]
async fn dynamodb_upsert_query_delete() -> Result<()> {
    let engine = dynamo_engine().await?;

    info!("Testing upsert");
    let first = engine
        .upsert(new_item("Smartphone", Category::Electrics, "599.99"))
        .await?;
    let second = engine
        .upsert(new_item("Smartphone", Category::Electrics, "649.99"))
        .await?;
    assert_eq!(first.id, second.id);

    info!("Testing category query through the index");
    let query = Query {
        filters: Filters {
            name: Some("smart".into()),
            category: Some("Electrics".into()),
            price_range: Some(PriceRange::new(dec("600"), dec("700"))),
        },
        ..Default::default()
    };
    let page = engine.query(&query).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].price, dec("649.99"));

    info!("Testing delete");
    let key = ItemKey::new("Smartphone", Category::Electrics);
    engine.delete(&key).await?;
    engine.delete(&key).await?;
    assert_eq!(engine.query(&query).await?.total, 0);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DynamoDB"]
async fn dynamodb_date_range_and_aggregate() -> Result<()> {
    let engine = dynamo_engine().await?;
    let before = Utc::now();
    engine
        .upsert(new_item("Rust Book", Category::Books, "39.99"))
        .await?;
    engine
        .upsert(new_item("Atlas", Category::Books, "10.01"))
        .await?;
    let after = Utc::now();

    let report = engine
        .filter_by_date_range(&DateRange::new(before, after)?)
        .await?;
    assert!(report.items.len() >= 2);

    let books = engine.aggregate("books").await?;
    assert!(books.groups[0].count >= 2);

    for name in ["Rust Book", "Atlas"] {
        engine.delete(&ItemKey::new(name, Category::Books)).await?;
    }
    Ok(())
}
