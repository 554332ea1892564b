//! In-memory `Container` and `Gpu` doubles shared by the unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::compile::ProgramSource;
use crate::gpu::{Gpu, PrismUniforms};
use crate::types::{Container, DrawableSize, ObserverId, ObserverKind, RenderError};

#[derive(Default)]
struct ContainerState {
    width: u32,
    height: u32,
    ratio: f64,
    disconnected: bool,
    next_id: u64,
    observers: HashMap<ObserverId, ObserverKind>,
    detached_twice: u32,
}

/// Container whose handle can be cloned so tests keep a view after the
/// session takes ownership.
#[derive(Clone, Default)]
pub(crate) struct FakeContainer {
    state: Rc<RefCell<ContainerState>>,
}

impl FakeContainer {
    pub fn new(width: u32, height: u32, ratio: f64) -> Self {
        let container = Self::default();
        {
            let mut state = container.state.borrow_mut();
            state.width = width;
            state.height = height;
            state.ratio = ratio;
        }
        container
    }

    pub fn set_client_size(&self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        state.width = width;
        state.height = height;
    }

    pub fn disconnect(&self) {
        self.state.borrow_mut().disconnected = true;
    }

    pub fn attached_observers(&self) -> usize {
        self.state.borrow().observers.len()
    }

    pub fn has_observer(&self, kind: ObserverKind) -> bool {
        self.state.borrow().observers.values().any(|k| *k == kind)
    }

    /// Number of `unobserve` calls for ids that were not attached.
    pub fn redundant_detaches(&self) -> u32 {
        self.state.borrow().detached_twice
    }
}

impl Container for FakeContainer {
    fn client_size(&self) -> (u32, u32) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().ratio
    }

    fn is_connected(&self) -> bool {
        !self.state.borrow().disconnected
    }

    fn observe(&mut self, kind: ObserverKind) -> ObserverId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = ObserverId(state.next_id);
        state.observers.insert(id, kind);
        id
    }

    fn unobserve(&mut self, id: ObserverId) {
        let mut state = self.state.borrow_mut();
        if state.observers.remove(&id).is_none() {
            state.detached_twice += 1;
        }
    }
}

#[derive(Default)]
struct LedgerState {
    contexts: u32,
    configures: Vec<(u32, u32)>,
    releases: u32,
    programs: u32,
    geometries: u32,
    draws: Vec<PrismUniforms>,
    fail_compile: bool,
    transient_failures: u32,
}

/// Shared record of everything the fake GPU was asked to do.
#[derive(Clone, Default)]
pub(crate) struct GpuLedger {
    state: Rc<RefCell<LedgerState>>,
}

impl GpuLedger {
    pub fn failing_compile() -> Self {
        let ledger = Self::default();
        ledger.state.borrow_mut().fail_compile = true;
        ledger
    }

    pub fn fail_next_draws(&self, count: u32) {
        self.state.borrow_mut().transient_failures = count;
    }

    pub fn contexts(&self) -> u32 {
        self.state.borrow().contexts
    }

    pub fn configure_calls(&self) -> usize {
        self.state.borrow().configures.len()
    }

    pub fn last_configure(&self) -> Option<(u32, u32)> {
        self.state.borrow().configures.last().copied()
    }

    pub fn releases(&self) -> u32 {
        self.state.borrow().releases
    }

    pub fn programs(&self) -> u32 {
        self.state.borrow().programs
    }

    pub fn geometries(&self) -> u32 {
        self.state.borrow().geometries
    }

    pub fn draws(&self) -> usize {
        self.state.borrow().draws.len()
    }

    pub fn last_draw(&self) -> Option<PrismUniforms> {
        self.state.borrow().draws.last().copied()
    }
}

pub(crate) struct FakeGpu {
    ledger: GpuLedger,
}

impl FakeGpu {
    pub fn new(ledger: &GpuLedger, _size: DrawableSize) -> Self {
        ledger.state.borrow_mut().contexts += 1;
        Self {
            ledger: ledger.clone(),
        }
    }
}

impl Drop for FakeGpu {
    fn drop(&mut self) {
        self.ledger.state.borrow_mut().releases += 1;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FakeProgram(pub u32);

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FakeGeometry(pub u32);

impl Gpu for FakeGpu {
    type Program = FakeProgram;
    type Geometry = FakeGeometry;

    fn configure(&mut self, width: u32, height: u32) {
        self.ledger.state.borrow_mut().configures.push((width, height));
    }

    fn compile_program(&mut self, _source: &ProgramSource<'_>) -> Result<FakeProgram, RenderError> {
        let mut state = self.ledger.state.borrow_mut();
        if state.fail_compile {
            return Err(RenderError::ShaderCompilation(
                "fragment stage unsupported".into(),
            ));
        }
        state.programs += 1;
        Ok(FakeProgram(state.programs))
    }

    fn create_geometry(&mut self) -> Result<FakeGeometry, RenderError> {
        let mut state = self.ledger.state.borrow_mut();
        state.geometries += 1;
        Ok(FakeGeometry(state.geometries))
    }

    fn draw(
        &mut self,
        _program: &FakeProgram,
        _geometry: &FakeGeometry,
        uniforms: &PrismUniforms,
    ) -> Result<(), RenderError> {
        let mut state = self.ledger.state.borrow_mut();
        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(RenderError::SurfaceUnavailable("outdated".into()));
        }
        state.draws.push(*uniforms);
        Ok(())
    }
}
