use crate::tdms::types::Value;

/// One channel of a group, materialized in memory.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// A group materialized as rows x named columns with a 0-based row index.
///
/// Channels in one group may have different lengths; shorter channels are
/// padded with empty cells when rows are rendered.
#[derive(Debug, Clone)]
pub struct GroupTable {
    name: String,
    columns: Vec<Column>,
}

impl GroupTable {
    pub fn new(name: String, columns: Vec<Column>) -> Self {
        Self { name, columns }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Header record: empty row-index label followed by the channel names,
    /// matching the original tool's dataframe rendering.
    pub fn header(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.columns.len() + 1);
        fields.push(String::new());
        fields.extend(self.columns.iter().map(|c| c.name.clone()));
        fields
    }

    /// Render one data row: row index followed by one cell per channel.
    /// Missing cells of short channels render as empty strings.
    pub fn row(&self, index: usize) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.columns.len() + 1);
        fields.push(index.to_string());
        for column in &self.columns {
            fields.push(
                column
                    .values
                    .get(index)
                    .map(Value::render)
                    .unwrap_or_default(),
            );
        }
        fields
    }
}
