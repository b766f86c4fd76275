//! Quote Receipt

use std::io;

use rebate::promotions::PromotionDetails;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::domain::coupons::CartQuote;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("failed to write receipt")]
    IO(#[from] io::Error),
}

/// Write a quote as a table of applied discounts followed by the totals.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_quote(out: &mut impl io::Write, quote: &CartQuote) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Code", "Details", "Discount"]);

    for applied in &quote.stacking.applied_discounts {
        builder.push_record([
            applied.code.clone(),
            describe(applied.details.as_ref()),
            format!("{}", applied.amount),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::last(), Alignment::right());

    writeln!(out, "\n{table}")?;
    writeln!(out, " Subtotal: {}", quote.subtotal)?;
    writeln!(out, " Discount: {}", quote.stacking.total_discount)?;
    writeln!(out, " Total:    {}", quote.total())?;

    for product in &quote.free_gift_product_uuids {
        writeln!(out, " Free gift: {product}")?;
    }

    Ok(())
}

fn describe(details: Option<&PromotionDetails>) -> String {
    match details {
        None => String::new(),
        Some(PromotionDetails::BuyXGetY { sets_qualified }) => {
            format!("{sets_qualified} set(s) qualified")
        }
        Some(PromotionDetails::Tiered {
            tier_reached: Some(tier),
        }) => format!("{}% tier from {}", tier.discount_percent, tier.threshold),
        Some(PromotionDetails::Tiered { tier_reached: None }) => "no tier reached".to_string(),
        Some(PromotionDetails::Bundle { bundle_complete }) => {
            if *bundle_complete {
                "bundle complete".to_string()
            } else {
                "bundle incomplete".to_string()
            }
        }
        Some(PromotionDetails::FreeGift {
            qualified,
            free_product_ids,
        }) => {
            if *qualified {
                format!("{} free gift(s)", free_product_ids.len())
            } else {
                "free gift not reached".to_string()
            }
        }
    }
}
