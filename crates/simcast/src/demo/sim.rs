use simcast_pipeline::{ControlInput, SimulationError, SimulationStepper};

/// Physical constants of the demo scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimParams {
    /// Number of bodies, one actuator each.
    pub bodies: usize,
    /// Fixed time step in seconds.
    pub dt: f64,
    pub mass: f64,
    /// Spring constant pulling each body toward `rest_height`.
    pub stiffness: f64,
    pub damping: f64,
    pub gravity: f64,
    pub rest_height: f64,
    /// Bodies are confined to `[0, world_height]`.
    pub world_height: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            bodies: 6,
            dt: 1.0 / 60.0,
            mass: 0.5,
            stiffness: 12.0,
            damping: 1.5,
            gravity: 9.81,
            rest_height: 1.0,
            world_height: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Horizontal position in `[0, 1]`, fixed.
    pub x: f64,
    /// Height above the floor.
    pub y: f64,
    pub vy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    pub step: u64,
    pub time: f64,
    pub world_height: f64,
    pub bodies: Vec<Body>,
}

/// Row of bodies on vertical springs, each pushed up by one thruster.
#[derive(Debug, Clone)]
pub struct MassSpringSim {
    params: SimParams,
    state: SimState,
}

impl MassSpringSim {
    pub fn new(params: SimParams) -> Self {
        let count = params.bodies;
        let bodies = (0..count)
            .map(|i| Body {
                x: (i as f64 + 0.5) / count as f64,
                y: params.rest_height,
                vy: 0.0,
            })
            .collect();
        Self {
            params,
            state: SimState {
                step: 0,
                time: 0.0,
                world_height: params.world_height,
                bodies,
            },
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }
}

impl Default for MassSpringSim {
    fn default() -> Self {
        Self::new(SimParams::default())
    }
}

impl SimulationStepper for MassSpringSim {
    type State = SimState;

    fn actuator_count(&self) -> usize {
        self.params.bodies
    }

    fn advance(&mut self, input: &ControlInput) -> Result<(), SimulationError> {
        if input.len() != self.params.bodies {
            return Err(SimulationError::new(format!(
                "expected {} control values, got {}",
                self.params.bodies,
                input.len()
            )));
        }

        let p = &self.params;
        let mut next = self.state.bodies.clone();
        for (body, thrust) in next.iter_mut().zip(input.as_slice()) {
            let force = -p.stiffness * (body.y - p.rest_height) - p.damping * body.vy
                - p.mass * p.gravity
                + thrust;
            // Semi-implicit Euler: velocity first, then position with the new velocity.
            body.vy += force / p.mass * p.dt;
            body.y += body.vy * p.dt;

            if body.y < 0.0 {
                body.y = 0.0;
                body.vy = 0.0;
            } else if body.y > p.world_height {
                body.y = p.world_height;
                body.vy = 0.0;
            }

            if !body.y.is_finite() || !body.vy.is_finite() {
                return Err(SimulationError::new(format!(
                    "state diverged at t={:.3}s",
                    self.state.time
                )));
            }
        }

        self.state.bodies = next;
        self.state.step += 1;
        self.state.time += p.dt;
        Ok(())
    }

    fn state(&self) -> &SimState {
        &self.state
    }
}
