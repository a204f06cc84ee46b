//! Shape of the flight-delay dataset.
//!
//! The crate never creates or alters tables in a real store. The description
//! here is used to verify an opened database has every column the queries
//! read, and to render DDL for in-memory fixtures.

/// Schema definition for the flight dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }
    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    /// `CREATE TABLE` statements for every table, in declaration order.
    pub fn create_sql(&self) -> String {
        self.tables
            .iter()
            .map(TableDefinition::create_sql)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(
        mut self,
        name: &str,
        data_type: DataType,
        constraints: &[ColumnConstraint],
    ) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.to_string(),
            data_type,
            constraints: constraints.to_vec(),
        });
        self
    }

    pub fn foreign_key(mut self, column: &str, foreign_table: &str, foreign_column: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.to_string(),
            foreign_table: foreign_table.to_string(),
            foreign_column: foreign_column.to_string(),
        });
        self
    }

    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(ColumnDefinition::sql).collect();
        parts.extend(self.foreign_keys.iter().map(|fk| {
            format!(
                "FOREIGN KEY ({}) REFERENCES {}({})",
                fk.column, fk.foreign_table, fk.foreign_column
            )
        }));
        format!("CREATE TABLE {} ({});", self.name, parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    fn sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type.sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.sql());
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataType {
    /// Read strictly as integers; the declared type must have INTEGER
    /// affinity.
    Integer,
    Text,
    /// Any affinity; values are normalized when queried.
    Numeric,
}

impl DataType {
    pub fn sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Numeric => "NUMERIC",
        }
    }

    /// Whether a column declared as `declared` can hold this type. Follows
    /// SQLite's affinity rule: a declared type containing `INT` has INTEGER
    /// affinity.
    pub fn accepts(self, declared: &str) -> bool {
        match self {
            DataType::Integer => declared.to_ascii_uppercase().contains("INT"),
            DataType::Text | DataType::Numeric => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
}

impl ColumnConstraint {
    fn sql(self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::NotNull => "NOT NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

/// The `airlines` and `flights` tables as the dataset ships them.
/// `DEPARTURE_DELAY` is nullable and, depending on how the export was
/// imported, may hold text such as empty strings.
pub fn flight_dataset() -> Schema {
    use ColumnConstraint::*;
    use DataType::*;

    Schema::new()
        .add_table(
            TableDefinition::new("airlines")
                .column("ID", Text, &[PrimaryKey])
                .column("AIRLINE", Text, &[NotNull]),
        )
        .add_table(
            TableDefinition::new("flights")
                .column("ID", Integer, &[PrimaryKey])
                .column("YEAR", Integer, &[])
                .column("MONTH", Integer, &[])
                .column("DAY", Integer, &[])
                .column("AIRLINE", Text, &[])
                .column("FLIGHT_NUMBER", Numeric, &[])
                .column("ORIGIN_AIRPORT", Text, &[])
                .column("DESTINATION_AIRPORT", Text, &[])
                .column("DEPARTURE_DELAY", Numeric, &[])
                .foreign_key("AIRLINE", "airlines", "ID"),
        )
}
