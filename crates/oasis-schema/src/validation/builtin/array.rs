//! Array keywords
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::Validator;
use crate::model::Schema;
use crate::validation::error::ValidationResult;
use serde_json::Value;

pub(super) fn visit(
    v: &Validator<'_>,
    schema: &Schema,
    items: &[Value],
    value: &Value,
    depth: usize,
) -> ValidationResult<()> {
    let mut outcome = v.outcome();
    let count = items.len() as u64;

    if count < schema.min_items {
        outcome.fail(v.error(
            schema,
            value,
            "minItems",
            format!("minimum number of items is {}", schema.min_items),
        ))?;
    }
    if let Some(max) = schema.max_items {
        if count > max {
            outcome.fail(v.error(schema, value, "maxItems", format!("maximum number of items is {}", max)))?;
        }
    }

    if schema.unique_items && !v.settings().items_are_unique(items) {
        outcome.fail(v.error(schema, value, "uniqueItems", "duplicate items found"))?;
    }

    if let Some(item_schema) = &schema.items {
        for (index, item) in items.iter().enumerate() {
            let result = v
                .visit_ref(item_schema, item, depth)
                .map_err(|err| err.at(&index.to_string()));
            outcome.record(result)?;
        }
    }

    outcome.finish()
}
