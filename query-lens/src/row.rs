/*
Rows of plain cell values, used by the in-memory query handle. Types
become rows by deriving IntoRow.
 */

use std::collections::BTreeMap;
use std::fmt::Display;

use serde_json::value::Value;
use serde_json::Number;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl CellValue {
    /// The text a pattern match sees for this cell.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::String(s) => Some(s.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Number(n) => Value::Number(n.clone()),
            CellValue::String(s) => Value::String(s.clone()),
        }
    }
}

pub trait IntoCellValue {
    fn to_cell_value(&self) -> CellValue;
}

pub trait StringCellValue {}

impl StringCellValue for String {}
impl StringCellValue for &str {}

impl<T> IntoCellValue for T
where
    T: StringCellValue + Display,
{
    fn to_cell_value(&self) -> CellValue {
        CellValue::String(self.to_string())
    }
}

impl IntoCellValue for bool {
    fn to_cell_value(&self) -> CellValue {
        CellValue::Bool(*self)
    }
}

macro_rules! integer_cells {
    ($($t:ty),*) => {
        $(
            impl IntoCellValue for $t {
                fn to_cell_value(&self) -> CellValue {
                    CellValue::Number(Number::from(*self))
                }
            }
        )*
    };
}

integer_cells!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);

impl IntoCellValue for f32 {
    fn to_cell_value(&self) -> CellValue {
        Number::from_f64((*self).into())
            .map(CellValue::Number)
            .unwrap_or(CellValue::Null)
    }
}

impl IntoCellValue for f64 {
    fn to_cell_value(&self) -> CellValue {
        Number::from_f64(*self)
            .map(CellValue::Number)
            .unwrap_or(CellValue::Null)
    }
}

impl<T: IntoCellValue> IntoCellValue for Option<T> {
    fn to_cell_value(&self) -> CellValue {
        match self {
            Some(v) => v.to_cell_value(),
            None => CellValue::Null,
        }
    }
}

pub trait CellVisitor {
    fn visit_value(&mut self, name: &str, v: CellValue);
}

pub trait ColumnVisitor {
    fn visit_column(&mut self, name: &str);
}

pub type Row = BTreeMap<String, CellValue>;

pub trait IntoRow {
    fn accept_cell_visitor<V: CellVisitor>(&self, visitor: &mut V);

    fn accept_column_visitor<V: ColumnVisitor>(visitor: &mut V);

    fn to_row(&self) -> Row {
        let mut r = RowVisitor {
            values: BTreeMap::new(),
        };
        self.accept_cell_visitor(&mut r);
        r.values
    }

    fn to_json(&self) -> Value {
        let mut j = JsonVisitor {
            value: serde_json::map::Map::new(),
        };
        self.accept_cell_visitor(&mut j);
        Value::Object(j.value)
    }

    fn columns() -> Vec<String> {
        let mut c = ColumnListVisitor { value: Vec::new() };
        Self::accept_column_visitor(&mut c);
        c.value
    }
}

struct RowVisitor {
    values: Row,
}

impl CellVisitor for RowVisitor {
    fn visit_value(&mut self, name: &str, v: CellValue) {
        self.values.insert(name.to_string(), v);
    }
}

struct JsonVisitor {
    value: serde_json::map::Map<String, Value>,
}

impl CellVisitor for JsonVisitor {
    fn visit_value(&mut self, name: &str, v: CellValue) {
        self.value.insert(name.to_string(), v.to_json());
    }
}

struct ColumnListVisitor {
    value: Vec<String>,
}

impl ColumnVisitor for ColumnListVisitor {
    fn visit_column(&mut self, name: &str) {
        self.value.push(name.to_string())
    }
}
