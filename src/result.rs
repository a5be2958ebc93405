//! Return code taxonomy.
//!
//! Every public, hot-path operation in this crate returns `Result<T>` where
//! the error variant is this flat, stable-numbered code enum rather than an
//! ad hoc error type per module. Numeric buckets are grouped per subsystem so
//! external tooling (CLI front ends, telemetry) can identify the failing
//! layer from the code alone.

use thiserror::Error;

/// Domain-scoped return/error code.
///
/// `#[repr(i32)]` and the explicit discriminants are load-bearing: they are
/// the wire values external consumers (CLI diagnostics, logs) key off of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[repr(i32)]
pub enum SfError {
    // ---- Special ----
    #[error("E_ASSERT (1): invariant violation")]
    Assert = 1,

    // ---- Region (32-63) ----
    #[error("E_RGN_SIZE (32): buffer size does not match region size")]
    RgnSize = 32,

    // ---- State Vector (64-95) ----
    #[error("E_SV_UNINIT (64): state vector not initialized")]
    SvUninit = 64,
    #[error("E_SV_REINIT (65): state vector already initialized")]
    SvReinit = 65,
    #[error("E_SV_EMPTY (66): state vector has no regions")]
    SvEmpty = 66,
    #[error("E_SV_TYPE (67): element type tag mismatch")]
    SvType = 67,
    #[error("E_SV_NULL (68): null state vector config")]
    SvNull = 68,
    #[error("E_SV_KEY (69): unknown element or region name")]
    SvKey = 69,
    #[error("E_SV_LAYOUT (70): region memory does not exactly tile its elements")]
    SvLayout = 70,
    #[error("E_SV_ELEM_DUPE (71): duplicate element name")]
    SvElemDupe = 71,
    #[error("E_SV_RGN_DUPE (72): duplicate region name")]
    SvRgnDupe = 72,

    // ---- Task (128-159) ----
    #[error("E_TSK_UNINIT (128): task not initialized")]
    TskUninit = 128,
    #[error("E_TSK_REINIT (129): task already initialized")]
    TskReinit = 129,
    #[error("E_TSK_MODE (130): invalid task mode value")]
    TskMode = 130,

    // ---- State Machine (160-191) ----
    #[error("E_SM_UNINIT (160): state machine not initialized")]
    SmUninit = 160,
    #[error("E_SM_REINIT (161): state machine already initialized")]
    SmReinit = 161,
    #[error("E_SM_STATE (162): initial state element value matches no configured state")]
    SmState = 162,
    #[error("E_SM_NULL (163): null state machine config")]
    SmNull = 163,
    #[error("E_SM_TIME (164): state machine time went backward or was unset")]
    SmTime = 164,
    #[error("E_SM_TRANS (165): transition references an unknown state")]
    SmTrans = 165,
    #[error("E_SM_TR_EXIT (166): exit label may not contain a transition")]
    SmTrExit = 166,
    #[error("E_SM_EMPTY (167): state machine config has no states")]
    SmEmpty = 167,

    // ---- RegionTxTask (192-223) ----
    #[error("E_RTX_SIZE (192): outbound region size does not match socket payload size")]
    RtxSize = 192,
    #[error("E_RTX_NULL (193): region tx task has no bound socket")]
    RtxNull = 193,

    // ---- RegionRxTask (224-255) ----
    #[error("E_RRX_NULL (224): region rx task has no bound socket")]
    RrxNull = 224,

    // ---- Executor (320-351) ----
    #[error("E_EXE_NULL (320): executor has no configured tasks")]
    ExeNull = 320,
    #[error("E_EXE_OVFL (321): clock is within one year of overflow")]
    ExeOvfl = 321,

    // ---- RealTimeExecutor (352-383) ----
    #[error("E_MSE_CORE (352): duplicate core id in executor config")]
    MseCore = 352,
    #[error("E_MSE_CNT (353): executor config has no cores")]
    MseCnt = 353,

    // ---- PAL: Socket (1024-1055) ----
    #[error("E_SOK_UNINIT (1024): socket not initialized")]
    SokUninit = 1024,
    #[error("E_SOK_REINIT (1025): socket already initialized")]
    SokReinit = 1025,
    #[error("E_SOK_OPEN (1027): failed to open socket")]
    SokOpen = 1027,
    #[error("E_SOK_BIND (1028): failed to bind socket")]
    SokBind = 1028,
    #[error("E_SOK_SEND (1029): failed to send on socket")]
    SokSend = 1029,
    #[error("E_SOK_RECV (1030): failed to receive on socket")]
    SokRecv = 1030,
    #[error("E_SOK_SEL (1031): socket select failed")]
    SokSel = 1031,
    #[error("E_SOK_CLOSE (1032): failed to close socket")]
    SokClose = 1032,

    // ---- PAL: Thread (1056-1087) ----
    #[error("E_THR_POL (1058): invalid thread scheduling policy")]
    ThrPol = 1058,
    #[error("E_THR_PRI (1059): invalid thread priority for policy")]
    ThrPri = 1059,
    #[error("E_THR_CREATE (1060): failed to create thread")]
    ThrCreate = 1060,
    #[error("E_THR_AFF (1061): failed to set thread affinity")]
    ThrAff = 1061,
    #[error("E_THR_AWAIT (1063): failed to await thread")]
    ThrAwait = 1063,

    // ---- PAL: Spinlock (1088-1119) ----
    #[error("E_SLK_REINIT (1089): spinlock already initialized")]
    SlkReinit = 1089,
    #[error("E_SLK_ACQ (1091): failed to acquire spinlock")]
    SlkAcq = 1091,
    #[error("E_SLK_REL (1092): failed to release spinlock")]
    SlkRel = 1092,
}

/// Result alias used throughout the crate's hot path.
pub type Result<T> = core::result::Result<T, SfError>;

/// Stable numeric discriminant, matching the original bucketed taxonomy.
impl SfError {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Assembly-time diagnostic pairing a [`SfError`] with an optional source
/// location, analogous to `sf::ConfigErrorInfo` in the original framework.
///
/// Not produced on the hot path; intended for CLI-style front ends that
/// render `line:col: message` to a human.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}{}", location.as_ref().map(|l| format!(" at {l}")).unwrap_or_default())]
pub struct ErrorInfo {
    pub error: SfError,
    pub location: Option<SourceLocation>,
}

impl ErrorInfo {
    pub fn new(error: SfError) -> Self {
        Self {
            error,
            location: None,
        }
    }

    pub fn at(error: SfError, location: SourceLocation) -> Self {
        Self {
            error,
            location: Some(location),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: u32,
    pub col: u32,
}

impl core::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
