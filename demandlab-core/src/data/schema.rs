use csv::StringRecord;

use crate::error::PipelineError;

/// Role a column plays in the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Item,
    Date,
    Quantity,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 3] = [ColumnRole::Item, ColumnRole::Date, ColumnRole::Quantity];

    /// Canonical header name.
    pub fn canonical(self) -> &'static str {
        match self {
            ColumnRole::Item => "Item",
            ColumnRole::Date => "Date",
            ColumnRole::Quantity => "Quantity",
        }
    }

    /// Accepted normalized headers, in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Item => &["item", "sku", "item_id", "product"],
            ColumnRole::Date => &["date", "ds"],
            ColumnRole::Quantity => &["quantity", "sales_qty", "qty", "y"],
        }
    }
}

/// Normalize a header for matching: trim surrounding whitespace, lowercase.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Positions of the required columns in a header row, plus the passthrough
/// columns the core ignores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub item: usize,
    pub date: usize,
    pub quantity: usize,
    pub passthrough: Vec<(usize, String)>,
}

impl ColumnMap {
    /// Resolve the required columns from a header record.
    pub fn resolve(headers: &StringRecord) -> Result<Self, PipelineError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();

        let find = |role: ColumnRole| -> Result<usize, PipelineError> {
            role.aliases()
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias))
                .ok_or_else(|| PipelineError::MissingColumn(role.canonical().to_string()))
        };

        let item = find(ColumnRole::Item)?;
        let date = find(ColumnRole::Date)?;
        let quantity = find(ColumnRole::Quantity)?;

        let passthrough = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != item && *i != date && *i != quantity)
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Self {
            item,
            date,
            quantity,
            passthrough,
        })
    }
}
