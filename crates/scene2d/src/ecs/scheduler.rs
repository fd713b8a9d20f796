//! Update loop
//!
//! Each frame pays out the accumulated fixed steps first, then runs one
//! variable-step pass. Passes iterate a snapshot of the store: component
//! types in registration order, components in insertion order. Components
//! added during a pass are awake already but only join the next pass.

use super::storage::ComponentKey;
use super::World;

impl World {
    /// Advance the world by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        let steps = self.scheduler.accumulate(delta_time);
        let step = self.scheduler.step();
        for _ in 0..steps {
            self.fixed_update_pass(step);
        }
        self.update_pass(delta_time);
    }

    /// Call `start` on every component, ignoring enabled and started flags
    ///
    /// Does not mark anything as started, so the first update still calls
    /// `start` again.
    pub fn start_all(&mut self) {
        self.run_pass(|world, key| {
            world.dispatch(key, |component, ctx| component.start(ctx));
        });
    }

    /// Fixed-step length currently in use
    pub fn fixed_timestep(&self) -> f32 {
        self.scheduler.step()
    }

    fn fixed_update_pass(&mut self, step: f32) {
        log::trace!("Scheduler: Fixed step of {}s", step);
        self.run_pass(|world, key| {
            if world.components.is_enabled(key) {
                world.dispatch(key, |component, ctx| component.fixed_update(ctx, step));
            }
        });
    }

    fn update_pass(&mut self, delta_time: f32) {
        self.run_pass(|world, key| {
            if world.components.is_enabled(key) && !world.components.is_started(key) {
                world.dispatch(key, |component, ctx| component.start(ctx));
                world.components.mark_started(key);
            }
            if world.components.is_enabled(key) {
                world.dispatch(key, |component, ctx| component.update(ctx, delta_time));
            }
        });
    }

    fn run_pass(&mut self, mut visit: impl FnMut(&mut World, ComponentKey)) {
        let order = self.components.iteration_order();
        self.begin_pass();
        for key in order {
            if self.components.contains(key) {
                visit(self, key);
            }
        }
        self.end_pass();
    }
}
