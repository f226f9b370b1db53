//! Scene aggregation.
//!
//! A [`Device`] owns the primitives of one chip, each with its own
//! placement on the sample. Fabrication order is insertion order unless an
//! entry is given a higher priority.

use crate::primitive::{BoundingBox, Primitive};
use crate::transform::{Transform, TransformStack};
use femtowrite_core::{CompileError, GeometryError, Point3, SceneError};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::debug;

/// Consumer of placed primitives, implemented by toolpath compilers.
pub trait ToolpathSink {
    /// Emits `primitive` after applying `placement`, then the sink's own
    /// global transforms.
    fn emit_placed(
        &mut self,
        primitive: &Primitive,
        placement: &TransformStack,
    ) -> Result<(), CompileError>;
}

/// Position of a primitive on the sample: scaled, rotated about the origin,
/// then offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub offset: Point3,
    /// Rotation about the z axis (radians)
    pub rotation: f64,
    pub scale: [f64; 3],
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            offset: Point3::origin(),
            rotation: 0.0,
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl Placement {
    pub fn at(offset: impl Into<Point3>) -> Self {
        Self {
            offset: offset.into(),
            ..Default::default()
        }
    }

    pub fn rotated(mut self, angle: f64) -> Self {
        self.rotation = angle;
        self
    }

    pub fn scaled(mut self, sx: f64, sy: f64, sz: f64) -> Self {
        self.scale = [sx, sy, sz];
        self
    }

    pub fn is_identity(&self) -> bool {
        *self == Placement::default()
    }

    /// Transform stack realizing this placement.
    pub fn to_stack(&self) -> Result<TransformStack, GeometryError> {
        let mut stack = TransformStack::new();
        let [sx, sy, sz] = self.scale;
        if self.scale != [1.0, 1.0, 1.0] {
            stack.push(Transform::homothety(sx, sy, sz))?;
        }
        if self.rotation != 0.0 {
            stack.push(Transform::rotation(self.rotation))?;
        }
        if self.offset != Point3::origin() {
            stack.push(Transform::translation(self.offset))?;
        }
        Ok(stack)
    }
}

/// A primitive placed in a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub primitive: Primitive,
    pub placement: Placement,
    /// Higher priorities are fabricated first
    #[serde(default)]
    pub priority: i32,
}

impl DeviceEntry {
    /// Bounding box of the placed primitive.
    pub fn bounding_box(&self) -> Result<Option<BoundingBox>, GeometryError> {
        let stack = self.placement.to_stack()?;
        let placed: Vec<Point3> = self
            .primitive
            .points()
            .map(|p| stack.apply_point(p.position))
            .collect();
        Ok(BoundingBox::from_points(&placed))
    }
}

/// Ordered collection of placed primitives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    name: String,
    entries: Vec<DeviceEntry>,
    #[serde(skip)]
    ids: HashSet<String>,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a primitive at its design coordinates.
    pub fn add(&mut self, primitive: Primitive) -> Result<(), SceneError> {
        self.add_placed(primitive, Placement::default())
    }

    pub fn add_placed(&mut self, primitive: Primitive, placement: Placement) -> Result<(), SceneError> {
        self.add_with_priority(primitive, placement, 0)
    }

    /// Appends a placed primitive ahead of every entry with a lower priority.
    pub fn add_with_priority(
        &mut self,
        primitive: Primitive,
        placement: Placement,
        priority: i32,
    ) -> Result<(), SceneError> {
        if self.ids.contains(primitive.id()) {
            return Err(SceneError::DuplicateIdentifier(primitive.id().to_string()));
        }
        debug!(
            "Device '{}': adding {} '{}' (priority {})",
            self.name,
            primitive.kind(),
            primitive.id(),
            priority
        );
        self.ids.insert(primitive.id().to_string());
        self.entries.push(DeviceEntry {
            primitive,
            placement,
            priority,
        });
        Ok(())
    }

    /// Changes the priority of `id`. Returns `false` if it is not in the
    /// device.
    pub fn set_priority(&mut self, id: &str, priority: i32) -> bool {
        match self.entries.iter_mut().find(|e| e.primitive.id() == id) {
            Some(entry) => {
                entry.priority = priority;
                true
            }
            None => false,
        }
    }

    /// Appends several primitives. Nothing is added if any identifier
    /// collides with the device or within the batch.
    pub fn extend<I>(&mut self, primitives: I) -> Result<(), SceneError>
    where
        I: IntoIterator<Item = Primitive>,
    {
        let batch: Vec<Primitive> = primitives.into_iter().collect();
        let mut seen = HashSet::new();
        for p in &batch {
            if self.ids.contains(p.id()) || !seen.insert(p.id()) {
                return Err(SceneError::DuplicateIdentifier(p.id().to_string()));
            }
        }
        for p in batch {
            self.add(p)?;
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&DeviceEntry> {
        self.entries.iter().find(|e| e.primitive.id() == id)
    }

    /// Entries in fabrication order: descending priority, then insertion
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        let mut ordered: Vec<&DeviceEntry> = self.entries.iter().collect();
        ordered.sort_by_key(|e| Reverse(e.priority));
        ordered.into_iter()
    }

    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.iter().map(|e| &e.primitive)
    }

    /// Feeds every entry to `sink` in fabrication order, stopping at the
    /// first failure.
    pub fn compile<S: ToolpathSink + ?Sized>(&self, sink: &mut S) -> Result<(), CompileError> {
        for entry in self.iter() {
            let placement = entry.placement.to_stack()?;
            sink.emit_placed(&entry.primitive, &placement)?;
        }
        Ok(())
    }

    /// Union of the placed bounding boxes.
    pub fn bounding_box(&self) -> Result<Option<BoundingBox>, GeometryError> {
        let mut acc: Option<BoundingBox> = None;
        for entry in &self.entries {
            if let Some(bb) = entry.bounding_box()? {
                acc = Some(match acc {
                    Some(a) => a.union(&bb),
                    None => bb,
                });
            }
        }
        Ok(acc)
    }

    /// Written length over all primitives and scans (mm).
    pub fn total_length(&self) -> f64 {
        self.primitives()
            .map(|p| p.writing_length() * f64::from(p.scan()))
            .sum()
    }

    /// Motion time over all primitives and scans, before pauses (s).
    pub fn fabrication_time(&self) -> f64 {
        self.primitives().map(Primitive::fabrication_time).sum()
    }

    /// Serializes the device layout to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Restores a device from [`to_json`](Self::to_json) output.
    pub fn from_json(json: &str) -> Result<Self, DeviceLoadError> {
        let mut device: Device = serde_json::from_str(json)?;
        let mut ids = HashSet::new();
        for p in device.primitives() {
            if !ids.insert(p.id().to_string()) {
                return Err(SceneError::DuplicateIdentifier(p.id().to_string()).into());
            }
        }
        device.ids = ids;
        Ok(device)
    }
}

/// Failure to restore a device layout.
#[derive(thiserror::Error, Debug)]
pub enum DeviceLoadError {
    #[error("Invalid device JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveguide::{Waveguide, WaveguideParameters};

    fn straight(id: &str, y: f64) -> Primitive {
        let params = WaveguideParameters {
            point_spacing: Some(1.0),
            ..Default::default()
        };
        let mut wg = Waveguide::with_id(id, params);
        wg.start([0.0, y, 0.035]).unwrap().linear([10.0, 0.0, 0.0]).unwrap();
        wg.end().unwrap()
    }

    #[test]
    fn test_insertion_order() {
        let mut d = Device::new("chip");
        d.add(straight("b", 0.0)).unwrap();
        d.add(straight("a", 0.08)).unwrap();
        let ids: Vec<_> = d.primitives().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(d.get("a").is_some());
        assert!(d.contains("b"));
    }

    #[test]
    fn test_duplicate_identifier() {
        let mut d = Device::new("chip");
        d.extend(vec![straight("wg", 0.0)]).unwrap();
        let err = d.extend(vec![straight("other", 1.0), straight("wg", 0.5)]).unwrap_err();
        assert_eq!(err, SceneError::DuplicateIdentifier("wg".to_string()));
        assert_eq!(d.len(), 1);
        assert!(!d.contains("other"));
    }

    #[test]
    fn test_duplicate_within_batch() {
        let mut d = Device::new("chip");
        let err = d
            .extend(vec![straight("x", 0.0), straight("x", 1.0)])
            .unwrap_err();
        assert!(matches!(err, SceneError::DuplicateIdentifier(_)));
        assert!(d.is_empty());
    }

    #[test]
    fn test_placement_and_bounding_box() {
        let mut d = Device::new("chip");
        d.add(straight("a", 0.0)).unwrap();
        d.add_placed(straight("b", 0.0), Placement::at([0.0, 5.0, 0.0]))
            .unwrap();
        let bb = d.bounding_box().unwrap().unwrap();
        assert_eq!(bb.min, Point3::new(0.0, 0.0, 0.035));
        assert_eq!(bb.max, Point3::new(10.0, 5.0, 0.035));
    }

    #[derive(Default)]
    struct Recorder {
        starts: Vec<(String, Point3)>,
    }

    impl ToolpathSink for Recorder {
        fn emit_placed(
            &mut self,
            primitive: &Primitive,
            placement: &TransformStack,
        ) -> Result<(), CompileError> {
            let start = placement.apply_point(primitive.start_point().unwrap_or_default());
            self.starts.push((primitive.id().to_string(), start));
            Ok(())
        }
    }

    #[test]
    fn test_compile_feeds_sink_in_order() {
        let mut d = Device::new("chip");
        d.add_placed(straight("a", 0.0), Placement::at([1.0, 0.0, 0.0]))
            .unwrap();
        d.add(straight("b", 0.5)).unwrap();
        let mut rec = Recorder::default();
        d.compile(&mut rec).unwrap();
        assert_eq!(
            rec.starts,
            vec![
                ("a".to_string(), Point3::new(1.0, 0.0, 0.035)),
                ("b".to_string(), Point3::new(0.0, 0.5, 0.035)),
            ]
        );
    }

    #[test]
    fn test_priority_overrides_insertion_order() {
        let mut d = Device::new("chip");
        d.add(straight("a", 0.0)).unwrap();
        d.add(straight("b", 0.5)).unwrap();
        d.add_with_priority(straight("marker", 2.0), Placement::default(), 5)
            .unwrap();
        d.add(straight("c", 1.0)).unwrap();
        assert!(d.set_priority("c", 1));
        assert!(!d.set_priority("missing", 1));

        let ids: Vec<_> = d.primitives().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, vec!["marker", "c", "a", "b"]);

        let mut rec = Recorder::default();
        d.compile(&mut rec).unwrap();
        let fed: Vec<_> = rec.starts.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(fed, vec!["marker", "c", "a", "b"]);

        let back = Device::from_json(&d.to_json().unwrap()).unwrap();
        let ids: Vec<_> = back.primitives().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, vec!["marker", "c", "a", "b"]);
    }

    #[test]
    fn test_totals() {
        let mut d = Device::new("chip");
        d.add(straight("a", 0.0)).unwrap();
        d.add(straight("b", 1.0)).unwrap();
        assert!((d.total_length() - 20.0).abs() < 1e-12);
        // 10 mm at 20 mm/s and 10 mm back at 5 mm/s, twice
        assert!((d.fabrication_time() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_json_round_trip() {
        let mut d = Device::new("chip");
        d.add(straight("a", 0.0)).unwrap();
        let json = d.to_json().unwrap();
        let back = Device::from_json(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert!(back.contains("a"));
        let mut back = back;
        assert!(back.add(straight("a", 2.0)).is_err());
    }
}
