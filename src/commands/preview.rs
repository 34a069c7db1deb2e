//! Show the post the next `send` would publish.

use crate::dispatch::Dispatcher;
use crate::error::Result;

/// CLI entry point
pub async fn run(dispatcher: &Dispatcher<'_>) -> Result<()> {
    match dispatcher.preview().await? {
        Some((item, caption)) => {
            println!("Row {} | image: {}", item.row, display_or_dash(&item.image));
            println!("{}", "-".repeat(40));
            println!("{}", caption);
        }
        None => println!("No pending promotions"),
    }
    Ok(())
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
