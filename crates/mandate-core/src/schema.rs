/// Arrow schema definitions for the linked document graph.
pub mod graph {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Column names of the linked-graph export, in schema order.
    pub const COLUMNS: &[&str] = &[
        "symbol",
        "doc_type",
        "title",
        "base_symbol",
        "link_target",
        "link_method",
        "link_confidence",
        "adopted",
    ];

    /// Schema for the linked-graph export: one row per document.
    pub fn linked_document_schema() -> Schema {
        Schema::new(vec![
            Field::new("symbol", DataType::Utf8, false),
            Field::new("doc_type", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("base_symbol", DataType::Utf8, true),
            Field::new("link_target", DataType::Utf8, true),
            Field::new("link_method", DataType::Utf8, true),
            Field::new("link_confidence", DataType::Float64, true),
            Field::new("adopted", DataType::Boolean, false),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::graph;

    #[test]
    fn linked_document_schema_has_expected_fields() {
        let schema = graph::linked_document_schema();
        assert_eq!(schema.fields().len(), graph::COLUMNS.len());
        for (field, name) in schema.fields().iter().zip(graph::COLUMNS) {
            assert_eq!(field.name(), name);
        }
        assert!(schema.field_with_name("link_confidence").unwrap().is_nullable());
        assert!(!schema.field_with_name("adopted").unwrap().is_nullable());
    }
}
