use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hubledger_core::{DomainResult, Entity, SkuId};

use crate::fields;

pub const SKU_CODE_MAX: usize = 64;
pub const SKU_NAME_MAX: usize = 180;
pub const SKU_COLOR_MAX: usize = 80;
pub const SKU_SIZE_MAX: usize = 40;
pub const SKU_BARCODE_MAX: usize = 64;

/// A distinct product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub id: SkuId,
    pub sku_code: String,
    pub name: String,
    pub color: String,
    pub size: String,
    pub barcode: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Sku {
    type Id = SkuId;

    fn id(&self) -> SkuId {
        self.id
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} – {}", self.sku_code, self.name)
    }
}

/// Canonical form of a SKU code: trimmed, upper-case.
pub fn normalize_sku_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Registration input for a SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSku {
    pub sku_code: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewSku {
    pub fn new(sku_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sku_code: sku_code.into(),
            name: name.into(),
            color: String::new(),
            size: String::new(),
            barcode: String::new(),
            active: true,
        }
    }

    pub fn variant(mut self, color: impl Into<String>, size: impl Into<String>) -> Self {
        self.color = color.into();
        self.size = size.into();
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = barcode.into();
        self
    }

    /// Normalize the code and check every field against its bounds.
    pub fn validated(self) -> DomainResult<Self> {
        let sku_code = fields::required("sku_code", &self.sku_code, SKU_CODE_MAX)?;
        Ok(Self {
            sku_code: normalize_sku_code(&sku_code),
            name: fields::required("name", &self.name, SKU_NAME_MAX)?,
            color: fields::optional("color", &self.color, SKU_COLOR_MAX)?,
            size: fields::optional("size", &self.size, SKU_SIZE_MAX)?,
            barcode: fields::optional("barcode", &self.barcode, SKU_BARCODE_MAX)?,
            active: self.active,
        })
    }

    pub fn into_sku(self, id: SkuId, created_at: DateTime<Utc>) -> Sku {
        Sku {
            id,
            sku_code: self.sku_code,
            name: self.name,
            color: self.color,
            size: self.size,
            barcode: self.barcode,
            active: self.active,
            created_at,
        }
    }
}

/// Partial administrative edit of a SKU. `None` leaves a field untouched.
///
/// The code is not editable: log entries and inventory rows refer to SKUs by id,
/// but operators recognise them by code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub barcode: Option<String>,
    pub active: Option<bool>,
}

impl SkuPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.size.is_none()
            && self.barcode.is_none()
            && self.active.is_none()
    }

    pub fn validated(self) -> DomainResult<Self> {
        Ok(Self {
            name: self
                .name
                .map(|v| fields::required("name", &v, SKU_NAME_MAX))
                .transpose()?,
            color: self
                .color
                .map(|v| fields::optional("color", &v, SKU_COLOR_MAX))
                .transpose()?,
            size: self
                .size
                .map(|v| fields::optional("size", &v, SKU_SIZE_MAX))
                .transpose()?,
            barcode: self
                .barcode
                .map(|v| fields::optional("barcode", &v, SKU_BARCODE_MAX))
                .transpose()?,
            active: self.active,
        })
    }

    /// Apply to a SKU in place. Returns whether anything changed.
    pub fn apply_to(&self, sku: &mut Sku) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            changed |= replace(&mut sku.name, name);
        }
        if let Some(color) = &self.color {
            changed |= replace(&mut sku.color, color);
        }
        if let Some(size) = &self.size {
            changed |= replace(&mut sku.size, size);
        }
        if let Some(barcode) = &self.barcode {
            changed |= replace(&mut sku.barcode, barcode);
        }
        if let Some(active) = self.active {
            if sku.active != active {
                sku.active = active;
                changed = true;
            }
        }
        changed
    }
}

fn replace(slot: &mut String, value: &str) -> bool {
    if slot == value {
        return false;
    }
    *slot = value.to_string();
    true
}
