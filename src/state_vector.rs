//! Named registry of [`Element`]s and [`Region`]s with a layout invariant.
//!
//! Grounded in `sfa/core/StateVector.cpp`. The original's `Config` is two
//! null-terminated C arrays of `(name, pointer)` pairs; the Rust equivalent
//! is two `Vec`s built through [`StateVectorConfigBuilder`], which is the
//! "config-compiler front end is out of scope, but something has to build
//! these" builder layer called for in §10.3.

use tracing::instrument;

use crate::element::{Element, IElement};
use crate::region::Region;
use crate::result::{Result, SfError};
use crate::types::Scalar;

struct ElementEntry {
    name: &'static str,
    elem: IElement,
}

struct RegionEntry<'lock> {
    name: &'static str,
    region: Region<'lock>,
}

/// Frozen state-vector configuration, produced by [`StateVectorConfigBuilder`]
/// and consumed exactly once by [`StateVector::init`].
pub struct StateVectorConfig<'lock> {
    elems: Vec<ElementEntry>,
    regions: Vec<RegionEntry<'lock>>,
}

/// Assembles a [`StateVectorConfig`]. Names are recorded in declaration
/// order, which is load-bearing: the layout validator walks elements and
/// regions in the order they were added here.
#[derive(Default)]
pub struct StateVectorConfigBuilder<'lock> {
    elems: Vec<ElementEntry>,
    regions: Vec<RegionEntry<'lock>>,
}

impl<'lock> StateVectorConfigBuilder<'lock> {
    pub fn new() -> Self {
        Self {
            elems: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn element<T: Scalar>(mut self, name: &'static str, elem: Element<T>) -> Self
    where
        IElement: From<Element<T>>,
    {
        self.elems.push(ElementEntry {
            name,
            elem: elem.into(),
        });
        self
    }

    pub fn region(mut self, name: &'static str, region: Region<'lock>) -> Self {
        self.regions.push(RegionEntry { name, region });
        self
    }

    pub fn build(self) -> StateVectorConfig<'lock> {
        StateVectorConfig {
            elems: self.elems,
            regions: self.regions,
        }
    }
}

/// `Uninitialized → Initialized`; init is rejected once initialized.
pub struct StateVector<'lock> {
    config: Option<StateVectorConfig<'lock>>,
}

impl<'lock> Default for StateVector<'lock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'lock> StateVector<'lock> {
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Validates and installs `config`.
    ///
    /// Checks, in order: not already initialized; at least one element;
    /// unique element names; unique region names; if regions are present,
    /// that element memory exactly tiles region memory in declaration order
    /// (the "bump pointer" walk from the original).
    #[instrument(skip_all, fields(elems = config.elems.len(), regions = config.regions.len()))]
    pub fn init(&mut self, config: StateVectorConfig<'lock>) -> Result<()> {
        if self.config.is_some() {
            return Err(SfError::SvReinit);
        }

        if config.elems.is_empty() {
            return Err(SfError::SvNull);
        }

        for i in 0..config.elems.len() {
            for j in (i + 1)..config.elems.len() {
                if config.elems[i].name == config.elems[j].name {
                    return Err(SfError::SvElemDupe);
                }
            }
        }

        for i in 0..config.regions.len() {
            for j in (i + 1)..config.regions.len() {
                if config.regions[i].name == config.regions[j].name {
                    return Err(SfError::SvRgnDupe);
                }
            }
        }

        Self::validate_layout(&config)?;

        tracing::debug!(elems = config.elems.len(), regions = config.regions.len(), "state vector initialized");
        self.config = Some(config);
        Ok(())
    }

    fn validate_layout(config: &StateVectorConfig<'lock>) -> Result<()> {
        if config.regions.is_empty() {
            return Ok(());
        }

        let mut elem_idx = 0usize;

        for region_entry in &config.regions {
            let region_base = region_entry.region.addr() as usize;
            let region_size = region_entry.region.size();
            let mut bump = region_base;

            while elem_idx < config.elems.len() && (bump - region_base) < region_size {
                let elem = &config.elems[elem_idx].elem;
                if elem.addr() != bump {
                    return Err(SfError::SvLayout);
                }
                bump += elem.size();
                elem_idx += 1;
            }

            if (bump - region_base) != region_size {
                return Err(SfError::SvLayout);
            }
        }

        Ok(())
    }

    fn find_elem(&self, name: &str) -> Result<&IElement> {
        let config = self.config.as_ref().ok_or(SfError::SvUninit)?;
        config
            .elems
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.elem)
            .ok_or(SfError::SvKey)
    }

    /// Returns the typed element named `name`. Fails with `E_SV_TYPE` if the
    /// element exists but was registered with a different scalar type.
    pub fn get_element<T: Scalar>(&self, name: &str) -> Result<Element<T>> {
        let ielem = self.find_elem(name)?;
        extract_typed::<T>(ielem)
    }

    /// Returns the type-erased handle for `name`.
    pub fn get_ielement(&self, name: &str) -> Result<IElement> {
        self.find_elem(name).map(|e| *e)
    }

    pub fn get_region(&self, name: &str) -> Result<&Region<'lock>> {
        let config = self.config.as_ref().ok_or(SfError::SvUninit)?;
        if config.regions.is_empty() {
            return Err(SfError::SvEmpty);
        }
        config
            .regions
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.region)
            .ok_or(SfError::SvKey)
    }
}

fn extract_typed<T: Scalar>(ielem: &IElement) -> Result<Element<T>> {
    macro_rules! try_variant {
        ($variant:ident) => {
            if let IElement::$variant(e) = ielem {
                // SAFETY: `T` and the stored scalar share the same layout
                // whenever the tags match, which the outer `if let` proves.
                if T::TAG == ielem.element_type() {
                    let ptr = e.addr() as *mut T;
                    return Ok(unsafe { Element::from_raw(ptr) });
                }
            }
        };
    }

    try_variant!(I8);
    try_variant!(I16);
    try_variant!(I32);
    try_variant!(I64);
    try_variant!(U8);
    try_variant!(U16);
    try_variant!(U32);
    try_variant!(U64);
    try_variant!(F32);
    try_variant!(F64);
    try_variant!(Bool);

    Err(SfError::SvType)
}
