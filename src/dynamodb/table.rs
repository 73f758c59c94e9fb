use crate::dynamodb::Schema;

/// Key layout of a table: partition key, optional sort key, the scalar type
/// of each key attribute and any global secondary indexes.
///
/// Used when the table is created on first start. Attributes missing from
/// the [`Schema`] are declared as strings.
#[derive(Debug)]
pub struct Table<'a> {
    name: &'a str,
    partition_key: &'a str,
    sort_key: Option<&'a str>,
    schema: Option<Schema>,
    indexes: Vec<SecondaryIndex<'a>>,
}

/// A global secondary index of a [`Table`].
///
/// Indexes created through this crate always project every attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex<'a> {
    name: &'a str,
    partition_key: &'a str,
    sort_key: Option<&'a str>,
}

impl<'a> SecondaryIndex<'a> {
    pub fn new(name: &'a str, partition_key: &'a str, sort_key: Option<&'a str>) -> Self {
        Self {
            name,
            partition_key,
            sort_key,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn partition_key(&self) -> &str {
        self.partition_key
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key
    }
}

impl<'a> Table<'a> {
    pub fn new(name: &'a str, partition_key: &'a str, sort_key: Option<&'a str>) -> Self {
        Self {
            name,
            partition_key,
            sort_key,
            schema: None,
            indexes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn partition_key(&self) -> &str {
        self.partition_key
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Adds a global secondary index.
    pub fn with_index(mut self, index: SecondaryIndex<'a>) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn indexes(&self) -> &[SecondaryIndex<'a>] {
        &self.indexes
    }

    /// Every attribute that appears in the table key or an index key, without
    /// duplicates, in first-seen order.
    pub fn key_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let candidates = std::iter::once(self.partition_key)
            .chain(self.sort_key)
            .chain(
                self.indexes
                    .iter()
                    .flat_map(|i| std::iter::once(i.partition_key).chain(i.sort_key)),
            );
        for name in candidates {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}
