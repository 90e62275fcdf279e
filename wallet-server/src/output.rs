//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

use wallet_core::Wallet;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Table of wallets with an ID and a balance column
pub fn wallet_table(wallets: &[Wallet]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Wallet ID", "Balance"]);
    for wallet in wallets {
        table.add_row(vec![wallet.id.to_string(), wallet.balance.to_string()]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_wallet_table_lists_every_wallet() {
        let wallets = vec![
            Wallet::new(Uuid::new_v4(), 1000),
            Wallet::new(Uuid::new_v4(), 0),
        ];
        let rendered = wallet_table(&wallets).to_string();

        for wallet in &wallets {
            assert!(rendered.contains(&wallet.id.to_string()));
        }
        assert!(rendered.contains("1000"));
        assert!(rendered.contains("Balance"));
    }
}
