//! Fixture entity shared by the unit tests.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Entity, EntityBase, EntityResult, HandlerTable};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Lamp {
    #[serde(flatten)]
    base: EntityBase<u64>,
    pub lit: bool,
    pub level: u8,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub color: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Dim {
    pub level: u8,
}

impl Lamp {
    pub fn new(id: u64) -> EntityResult<Self> {
        Ok(Self {
            base: EntityBase::new::<Self>(id)?,
            lit: false,
            level: 0,
            settings: Settings::default(),
        })
    }

    pub fn switch_on(&mut self) -> EntityResult<&mut Self> {
        self.lit = true;
        self.record("switch_on", ())?;
        self.emit("lit", &Value::Null);
        Ok(self)
    }

    pub fn dim(&mut self, data: Dim) -> EntityResult<&mut Self> {
        self.level = data.level;
        self.record("dim", &data)?;
        self.enqueue("dimmed", &data)?;
        Ok(self)
    }
}

impl Entity for Lamp {
    type Id = u64;

    fn base(&self) -> &EntityBase<u64> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase<u64> {
        &mut self.base
    }

    fn handlers() -> &'static HandlerTable<Self> {
        static HANDLERS: OnceLock<HandlerTable<Lamp>> = OnceLock::new();
        HANDLERS.get_or_init(|| {
            HandlerTable::new()
                .on("switch_on", |lamp: &mut Lamp, _: ()| lamp.switch_on().map(drop))
                .on("dim", |lamp: &mut Lamp, data: Dim| lamp.dim(data).map(drop))
        })
    }
}
