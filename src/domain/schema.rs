//! Column names and expected CSV schemas of the three input tables.

pub const STORE: &str = "Store";
pub const DAY_OF_WEEK: &str = "DayOfWeek";
pub const DATE: &str = "Date";
pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const SALES: &str = "Sales";
pub const CUSTOMERS: &str = "Customers";
pub const OPEN: &str = "Open";
pub const PROMO: &str = "Promo";
pub const STATE_HOLIDAY: &str = "StateHoliday";
pub const SCHOOL_HOLIDAY: &str = "SchoolHoliday";
pub const ID: &str = "Id";

pub const STORE_TYPE: &str = "StoreType";
pub const ASSORTMENT: &str = "Assortment";
pub const COMPETITION_DISTANCE: &str = "CompetitionDistance";
pub const COMPETITION_OPEN_SINCE_MONTH: &str = "CompetitionOpenSinceMonth";
pub const COMPETITION_OPEN_SINCE_YEAR: &str = "CompetitionOpenSinceYear";
pub const PROMO2: &str = "Promo2";
pub const PROMO2_SINCE_WEEK: &str = "Promo2SinceWeek";
pub const PROMO2_SINCE_YEAR: &str = "Promo2SinceYear";
pub const PROMO_INTERVAL: &str = "PromoInterval";

/// StateHoliday labels in code order: none, public, easter, christmas.
pub const STATE_HOLIDAY_LEVELS: [&str; 4] = ["0", "a", "b", "c"];

/// How a CSV field is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer if every present value parses as one, else float.
    Number,
    /// Kept as a string regardless of content.
    Text,
    /// Calendar date.
    Date,
}

#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub file_name: &'static str,
    pub fields: &'static [(&'static str, FieldKind)],
}

impl TableSchema {
    pub fn kind_of(&self, column: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, kind)| *kind)
    }
}

pub const TRAIN_SCHEMA: TableSchema = TableSchema {
    name: "train",
    file_name: "train.csv",
    fields: &[
        (STORE, FieldKind::Number),
        (DAY_OF_WEEK, FieldKind::Number),
        (DATE, FieldKind::Date),
        (SALES, FieldKind::Number),
        (CUSTOMERS, FieldKind::Number),
        (OPEN, FieldKind::Number),
        (PROMO, FieldKind::Number),
        (STATE_HOLIDAY, FieldKind::Text),
        (SCHOOL_HOLIDAY, FieldKind::Text),
    ],
};

pub const TEST_SCHEMA: TableSchema = TableSchema {
    name: "test",
    file_name: "test.csv",
    fields: &[
        (ID, FieldKind::Number),
        (STORE, FieldKind::Number),
        (DAY_OF_WEEK, FieldKind::Number),
        (DATE, FieldKind::Date),
        (OPEN, FieldKind::Number),
        (PROMO, FieldKind::Number),
        (STATE_HOLIDAY, FieldKind::Text),
        (SCHOOL_HOLIDAY, FieldKind::Text),
    ],
};

pub const STORE_SCHEMA: TableSchema = TableSchema {
    name: "store",
    file_name: "store.csv",
    fields: &[
        (STORE, FieldKind::Number),
        (STORE_TYPE, FieldKind::Text),
        (ASSORTMENT, FieldKind::Text),
        (COMPETITION_DISTANCE, FieldKind::Number),
        (COMPETITION_OPEN_SINCE_MONTH, FieldKind::Number),
        (COMPETITION_OPEN_SINCE_YEAR, FieldKind::Number),
        (PROMO2, FieldKind::Number),
        (PROMO2_SINCE_WEEK, FieldKind::Number),
        (PROMO2_SINCE_YEAR, FieldKind::Number),
        (PROMO_INTERVAL, FieldKind::Text),
    ],
};

/// Train column order once calendar fields are derived.
pub const TRAIN_ORDER: [&str; 11] = [
    STORE,
    DAY_OF_WEEK,
    DATE,
    YEAR,
    MONTH,
    CUSTOMERS,
    OPEN,
    PROMO,
    STATE_HOLIDAY,
    SCHOOL_HOLIDAY,
    SALES,
];

/// Test column order once calendar fields are derived.
pub const TEST_ORDER: [&str; 10] = [
    ID,
    STORE,
    DAY_OF_WEEK,
    DATE,
    YEAR,
    MONTH,
    OPEN,
    PROMO,
    STATE_HOLIDAY,
    SCHOOL_HOLIDAY,
];

/// Columns used for the exploratory correlation matrix.
pub const CORRELATION_COLUMNS: [&str; 8] = [
    DAY_OF_WEEK,
    SALES,
    MONTH,
    YEAR,
    CUSTOMERS,
    PROMO,
    STATE_HOLIDAY,
    SCHOOL_HOLIDAY,
];
