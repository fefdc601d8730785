use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One table row: field name to raw value, in the order the fields arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.data)
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub display_records: Vec<Record>,
    pub columns: Vec<String>,
    pub csv_output: String,
    pub tsv_output: String,
}

/// 使用者管理 API 回傳的原始資料列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: Option<i64>,
    pub email: Option<String>,
    pub create_time: String,
    pub role: String,
    pub project: String,
}

/// 表格顯示用的使用者資料列
///
/// Numeric columns stay JSON values because the fallback rule passes numbers
/// through untouched; everything else is a display string after transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: Value,
    pub name: String,
    pub age: Value,
    pub email: String,
    pub create_time: String,
    pub role: String,
    pub project: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData<T> {
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub list: Vec<T>,
}

/// API 表格回應外層結構
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePage<T> {
    pub code: i64,
    pub msg: String,
    pub data: TableData<T>,
}

pub const DEFAULT_PAGE_NUM: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Paging request with the list endpoint's normalization applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page_num: usize,
    pub page_size: usize,
}

impl PageQuery {
    /// Missing or zero values fall back to the defaults; size is capped at [`MAX_PAGE_SIZE`].
    pub fn normalize(page_num: Option<usize>, page_size: Option<usize>) -> Self {
        let page_num = match page_num {
            Some(n) if n > 0 => n,
            _ => DEFAULT_PAGE_NUM,
        };
        let page_size = match page_size {
            Some(s) if s > 0 => s.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        Self {
            page_num,
            page_size,
        }
    }

    pub fn offset(&self) -> usize {
        self.page_num.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::normalize(None, None)
    }
}
