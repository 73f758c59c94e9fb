use crate::error::InventoryError;
use crate::inventory::{
    DateRange, Filters, InventoryEngine, InventoryItem, ItemKey, NewItem, Pagination, PriceRange,
    Query, Sort, SortField, SortOrder,
};
use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use std::io::{self, Write};
use tracing::{error, info};

/// Runs the command-line interface over the inventory engine.
///
/// This function enters a loop that prompts the user for commands and executes them.
/// The supported commands are:
/// - upsert: Create an item or update the price of an existing one
/// - delete: Delete an item by name and category
/// - query: Filter, sort and paginate items
/// - date_range: List items updated within a time window and their total price
/// - aggregate: Count and sum prices per category
/// - list: List every item, newest first
/// - exit: Exit the program
///
/// Failed commands print their error and the loop continues. Store failures
/// are also logged.
pub async fn run(engine: &InventoryEngine) -> Result<()> {
    loop {
        let command = prompt(
            "Enter command (upsert/delete/query/date_range/aggregate/list/exit)",
            None,
        )?;
        let outcome = match command.as_str() {
            "upsert" => upsert_item(engine).await,
            "delete" => delete_item(engine).await,
            "query" => query_items(engine).await,
            "date_range" => date_range_items(engine).await,
            "aggregate" => aggregate_items(engine).await,
            "list" => list_items(engine).await,
            "exit" => break,
            _ => {
                println!("Unknown command. Please try again.");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            let invalid_input = e
                .downcast_ref::<InventoryError>()
                .is_some_and(InventoryError::is_validation);
            if invalid_input {
                println!("Invalid input: {e}");
            } else {
                error!("Command '{command}' failed: {e:#}");
                println!("Error: {e}");
            }
        }
    }
    Ok(())
}

async fn upsert_item(engine: &InventoryEngine) -> Result<()> {
    let name = prompt("Enter name", Some("Pen"))?;
    let category = prompt("Enter category", Some("Stationary"))?.parse()?;
    let price = prompt("Enter price", Some("1.5"))?.parse::<Decimal>()?;

    let stored = engine.upsert(NewItem::new(name, category, price)?).await?;
    info!("Item {} saved", stored.id);
    print_items("Saved", std::slice::from_ref(&stored));
    Ok(())
}

async fn delete_item(engine: &InventoryEngine) -> Result<()> {
    let name = prompt("Enter name", None)?;
    let category = prompt("Enter category", None)?.parse()?;
    engine.delete(&ItemKey::new(name, category)).await?;
    println!("Item deleted successfully!");
    Ok(())
}

async fn query_items(engine: &InventoryEngine) -> Result<()> {
    let filters = Filters {
        name: prompt_optional("Name contains", Some("pen"))?,
        category: prompt_optional("Category", Some("Books"))?,
        price_range: prompt_optional("Price range", Some("1,19"))?
            .map(|s| parse_price_range(&s))
            .transpose()?,
    };
    let sort = match prompt_optional("Sort", Some("price asc"))? {
        Some(s) => parse_sort(&s)?,
        None => Sort::default(),
    };
    let page = prompt_optional("Page", Some("1"))?
        .map(|s| s.parse::<u32>())
        .transpose()?;
    let pagination = page.map(|page| -> Result<Pagination> {
        let limit = prompt_optional("Limit", Some("10"))?
            .map(|s| s.parse::<u32>())
            .transpose()?
            .unwrap_or(Pagination::default().limit);
        Ok(Pagination::new(page, limit))
    });

    let query = Query {
        filters,
        pagination: pagination.transpose()?,
        sort,
    };
    let page = engine.query(&query).await?;
    print_items("Query Results", &page.items);
    println!("Showing {} of {} matching item(s)", page.count, page.total);
    Ok(())
}

async fn date_range_items(engine: &InventoryEngine) -> Result<()> {
    let from = prompt("From", Some("2024-01-01"))?;
    let to = prompt("To", Some("2024-12-31T23:59:59Z"))?;
    let report = engine
        .filter_by_date_range(&DateRange::parse(&from, &to)?)
        .await?;
    print_items("Updated In Range", &report.items);
    println!("Total price: {:.2}", report.total_price);
    Ok(())
}

async fn aggregate_items(engine: &InventoryEngine) -> Result<()> {
    let scope = prompt("Category or 'all'", Some("all"))?;
    let report = engine.aggregate(&scope).await?;
    println!("\n--- Totals ---");
    for group in &report.groups {
        println!(
            "{:<12} count: {:<5} total: {:.2}",
            group.category, group.count, group.total_price
        );
    }
    println!(
        "{:<12} count: {:<5} total: {:.2}",
        "ALL", report.count, report.total_price
    );
    println!("--------------\n");
    Ok(())
}

async fn list_items(engine: &InventoryEngine) -> Result<()> {
    let page = engine.query(&Query::default()).await?;
    print_items("Inventory", &page.items);
    Ok(())
}

/// Parses `"min,max"` into an inclusive price range.
fn parse_price_range(input: &str) -> Result<PriceRange> {
    let (min, max) = input
        .split_once(',')
        .ok_or_else(|| anyhow!("Expected 'min,max', got '{input}'"))?;
    Ok(PriceRange::new(min.trim().parse()?, max.trim().parse()?))
}

/// Parses `"<field> [asc|desc]"`. Order defaults to ascending.
fn parse_sort(input: &str) -> Result<Sort> {
    let mut parts = input.split_whitespace();
    let field = match parts.next() {
        Some("name") => SortField::Name,
        Some("category") => SortField::Category,
        Some("price") => SortField::Price,
        Some("last_updated_dt") => SortField::LastUpdatedDt,
        other => return Err(anyhow!("Unknown sort field {other:?}")),
    };
    let order = match parts.next() {
        None | Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        Some(other) => return Err(anyhow!("Unknown sort order '{other}'")),
    };
    Ok(Sort::new(field, order))
}

fn print_items(title: &str, items: &[InventoryItem]) {
    println!("\n--- {} ---", title);
    for item in items {
        println!(
            "{:<24} {:<12} {:>10.2}  {}",
            item.name,
            item.category,
            item.price,
            item.last_updated_dt.to_rfc3339()
        );
    }
    println!("-------------------------\n");
}

fn prompt(message: &str, example: Option<&str>) -> Result<String> {
    let full_message = if let Some(ex) = example {
        format!("{} (e.g., {}): ", message, ex)
    } else {
        format!("{}: ", message)
    };
    print!("{}", full_message);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_optional(message: &str, example: Option<&str>) -> Result<Option<String>> {
    let input = prompt(&format!("{message} (optional)"), example)?;
    Ok((!input.is_empty()).then_some(input))
}
