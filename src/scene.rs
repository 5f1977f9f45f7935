//! Declarative scene description. The ride publishes what should be on screen
//! each tick; views reconcile it against what they already show.

use cgmath::Vector3;
use std::collections::HashMap;

use crate::obstacles::ObstacleId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderableKey {
    Player,
    Obstacle(ObstacleId),
}

/// A sphere in the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Renderable {
    pub key: RenderableKey,
    pub position: Vector3<f32>,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneSnapshot {
    pub camera: CameraPose,
    pub renderables: Vec<Renderable>,
    pub playing: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDiff {
    pub added: Vec<Renderable>,
    pub moved: Vec<Renderable>,
    pub removed: Vec<RenderableKey>,
}

impl SceneDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.moved.is_empty() && self.removed.is_empty()
    }
}

/// Anything that can show a scene snapshot.
pub trait SceneView {
    fn draw(&mut self, scene: &SceneSnapshot);
}

/// Tracks what a view currently shows and turns each new snapshot into the
/// minimal set of additions, moves and removals.
#[derive(Debug, Default)]
pub struct SceneReconciler {
    shown: HashMap<RenderableKey, Renderable>,
}

impl SceneReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(&mut self, scene: &SceneSnapshot) -> SceneDiff {
        let mut diff = SceneDiff::default();
        let mut next = HashMap::with_capacity(scene.renderables.len());

        for renderable in &scene.renderables {
            match self.shown.remove(&renderable.key) {
                None => diff.added.push(*renderable),
                Some(previous) if previous != *renderable => diff.moved.push(*renderable),
                Some(_) => {}
            }
            next.insert(renderable.key, *renderable);
        }

        diff.removed.extend(self.shown.drain().map(|(key, _)| key));
        diff.removed.sort();
        self.shown = next;
        diff
    }

    pub fn shown(&self) -> impl Iterator<Item = &Renderable> {
        self.shown.values()
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(renderables: Vec<Renderable>) -> SceneSnapshot {
        SceneSnapshot {
            camera: CameraPose {
                position: Vector3::new(0.0, 0.0, 0.0),
                target: Vector3::new(0.0, 0.0, -1.0),
                up: Vector3::unit_y(),
            },
            renderables,
            playing: true,
        }
    }

    fn sphere(key: RenderableKey, x: f32) -> Renderable {
        Renderable {
            key,
            position: Vector3::new(x, 0.0, 0.0),
            radius: 0.03,
        }
    }

    #[test]
    fn first_snapshot_adds_everything() {
        let mut reconciler = SceneReconciler::new();
        let diff = reconciler.reconcile(&snapshot(vec![
            sphere(RenderableKey::Player, 0.0),
            sphere(RenderableKey::Obstacle(ObstacleId(3)), 1.0),
        ]));
        assert_eq!(diff.added.len(), 2);
        assert!(diff.moved.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(reconciler.len(), 2);
    }

    #[test]
    fn unchanged_snapshot_yields_an_empty_diff() {
        let mut reconciler = SceneReconciler::new();
        let scene = snapshot(vec![sphere(RenderableKey::Obstacle(ObstacleId(1)), 1.0)]);
        reconciler.reconcile(&scene);
        assert!(reconciler.reconcile(&scene).is_empty());
    }

    #[test]
    fn moves_and_removals_are_reported() {
        let mut reconciler = SceneReconciler::new();
        reconciler.reconcile(&snapshot(vec![
            sphere(RenderableKey::Player, 0.0),
            sphere(RenderableKey::Obstacle(ObstacleId(1)), 1.0),
            sphere(RenderableKey::Obstacle(ObstacleId(2)), 2.0),
        ]));

        let diff = reconciler.reconcile(&snapshot(vec![
            sphere(RenderableKey::Player, 0.5),
            sphere(RenderableKey::Obstacle(ObstacleId(2)), 2.0),
            sphere(RenderableKey::Obstacle(ObstacleId(4)), 4.0),
        ]));
        assert_eq!(diff.moved, vec![sphere(RenderableKey::Player, 0.5)]);
        assert_eq!(diff.removed, vec![RenderableKey::Obstacle(ObstacleId(1))]);
        assert_eq!(diff.added, vec![sphere(RenderableKey::Obstacle(ObstacleId(4)), 4.0)]);
    }

    #[test]
    fn empty_snapshot_removes_everything() {
        let mut reconciler = SceneReconciler::new();
        reconciler.reconcile(&snapshot(vec![
            sphere(RenderableKey::Obstacle(ObstacleId(2)), 2.0),
            sphere(RenderableKey::Player, 0.0),
        ]));
        let diff = reconciler.reconcile(&snapshot(Vec::new()));
        assert_eq!(
            diff.removed,
            vec![RenderableKey::Player, RenderableKey::Obstacle(ObstacleId(2))]
        );
        assert!(reconciler.is_empty());
    }
}
