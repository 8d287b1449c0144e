//! Cleanup configuration.

use scene_types::PointClass;

use crate::error::{CleanupError, CleanupResult};
use crate::scope::Scope;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to do with entity references to orphan materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrphanMaterialMode {
    /// Leave orphan references alone.
    #[default]
    Ignore,
    /// Replace each orphan with a listed clone.
    Repair,
    /// Clear orphan references.
    Strip,
}

/// Tunables for the overlap test used by duplicate-face erasure.
///
/// A face B whose vertices are a strict subset of face A's is probed just
/// past one of B's edges that A does not share. B counts as overlapped when
/// the probe classifies as one of [`OverlapParams::contained`] against A.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct OverlapParams {
    /// Distance from the edge start to the probe point, along the edge.
    ///
    /// Default: `0.01`
    pub probe_offset: f64,

    /// Tolerance handed to point classification.
    ///
    /// Default: `1e-9`
    pub classify_tolerance: f64,

    /// Classes that count as "inside A".
    ///
    /// Default: `[Inside, OnVertex, OnEdge]`
    pub contained: Vec<PointClass>,
}

impl Default for OverlapParams {
    fn default() -> Self {
        Self {
            probe_offset: 0.01,
            classify_tolerance: 1e-9,
            contained: vec![PointClass::Inside, PointClass::OnVertex, PointClass::OnEdge],
        }
    }
}

/// Configuration for a cleanup run.
///
/// Field defaults match what a fresh install of the cleanup tool offers.
///
/// # Example
///
/// ```
/// use scene_cleanup::{CleanupParams, Scope};
///
/// let params = CleanupParams::default()
///     .with_scope(Scope::Selection)
///     .with_erase_hidden(true)
///     .with_smooth_angle(30.0);
/// assert!(params.merge_coplanar_faces);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
#[allow(clippy::struct_excessive_bools)]
pub struct CleanupParams {
    /// Which entities the scoped passes visit.
    ///
    /// Default: [`Scope::WholeModel`]
    pub scope: Scope,

    /// Ask the host for a validity check after the operation commits.
    ///
    /// Default: `true`
    pub validate_after: bool,

    /// Hand the statistics report to the host for display.
    ///
    /// Default: `true`
    pub show_statistics: bool,

    /// Purge unused definitions, layers and materials.
    ///
    /// Default: `true`
    pub purge_unused: bool,

    /// Erase hidden entities and entities on hidden layers.
    ///
    /// Default: `false`
    pub erase_hidden: bool,

    /// Erase duplicate and overlapped faces.
    ///
    /// Default: `false`
    pub erase_duplicate_faces: bool,

    /// Move edges and faces to the default layer.
    ///
    /// Default: `false`
    pub geometry_to_default_layer: bool,

    /// Merge materials that look identical.
    ///
    /// Default: `false`
    pub merge_materials: bool,

    /// Ignore attribute dictionaries when comparing materials.
    ///
    /// Default: `true`
    pub merge_ignore_attributes: bool,

    /// Merge coplanar faces by erasing the edge between them.
    ///
    /// Default: `true`
    pub merge_coplanar_faces: bool,

    /// Merge faces even when their normals point opposite ways.
    ///
    /// Default: `false`
    pub merge_ignore_normals: bool,

    /// Merge faces even when their materials differ.
    ///
    /// Default: `false`
    pub merge_ignore_materials: bool,

    /// Merge textured faces without checking UV continuity.
    ///
    /// Default: `true`
    #[cfg_attr(feature = "serde", serde(rename = "mergeIgnoreUV"))]
    pub merge_ignore_uv: bool,

    /// Join collinear edges split by an otherwise unused vertex.
    ///
    /// Default: `true`
    pub repair_split_edges: bool,

    /// Erase edges that bound no face.
    ///
    /// Default: `true`
    pub erase_lonely_edges: bool,

    /// Clear edge materials.
    ///
    /// Default: `false`
    pub remove_edge_materials: bool,

    /// Smooth and soften edges whose faces meet within this angle (degrees).
    /// `0` disables smoothing.
    ///
    /// Default: `0.0`
    pub smooth_angle_degrees: f64,

    /// Distance from the best-fit plane a vertex may be for two faces to
    /// count as coplanar.
    ///
    /// Default: `1e-6`
    pub coplanar_tolerance: f64,

    /// Allowed difference between normalized texture coordinates.
    ///
    /// Default: `0.0` (exact)
    pub uv_tolerance: f64,

    /// Overlap test used by duplicate-face erasure.
    pub overlap: OverlapParams,

    /// Orphan material handling.
    ///
    /// Default: [`OrphanMaterialMode::Ignore`]
    pub orphan_materials: OrphanMaterialMode,
}

impl Default for CleanupParams {
    fn default() -> Self {
        Self {
            scope: Scope::WholeModel,
            validate_after: true,
            show_statistics: true,
            purge_unused: true,
            erase_hidden: false,
            erase_duplicate_faces: false,
            geometry_to_default_layer: false,
            merge_materials: false,
            merge_ignore_attributes: true,
            merge_coplanar_faces: true,
            merge_ignore_normals: false,
            merge_ignore_materials: false,
            merge_ignore_uv: true,
            repair_split_edges: true,
            erase_lonely_edges: true,
            remove_edge_materials: false,
            smooth_angle_degrees: 0.0,
            coplanar_tolerance: 1e-6,
            uv_tolerance: 0.0,
            overlap: OverlapParams::default(),
            orphan_materials: OrphanMaterialMode::Ignore,
        }
    }
}

impl CleanupParams {
    /// Every pass on, including the expensive duplicate-face search and
    /// material merging. Orphan materials are repaired.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            erase_hidden: true,
            erase_duplicate_faces: true,
            merge_materials: true,
            merge_ignore_uv: false,
            orphan_materials: OrphanMaterialMode::Repair,
            ..Default::default()
        }
    }

    /// Only purge, coplanar merging and lonely edges. Nothing that changes
    /// how the model looks.
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            repair_split_edges: false,
            ..Default::default()
        }
    }

    /// Set the scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set whether to validate after committing.
    #[must_use]
    pub const fn with_validate_after(mut self, validate: bool) -> Self {
        self.validate_after = validate;
        self
    }

    /// Set whether to show statistics.
    #[must_use]
    pub const fn with_show_statistics(mut self, show: bool) -> Self {
        self.show_statistics = show;
        self
    }

    /// Set whether to purge unused resources.
    #[must_use]
    pub const fn with_purge_unused(mut self, purge: bool) -> Self {
        self.purge_unused = purge;
        self
    }

    /// Set whether to erase hidden entities.
    #[must_use]
    pub const fn with_erase_hidden(mut self, erase: bool) -> Self {
        self.erase_hidden = erase;
        self
    }

    /// Set whether to erase duplicate faces.
    #[must_use]
    pub const fn with_erase_duplicate_faces(mut self, erase: bool) -> Self {
        self.erase_duplicate_faces = erase;
        self
    }

    /// Set whether to move geometry to the default layer.
    #[must_use]
    pub const fn with_geometry_to_default_layer(mut self, enabled: bool) -> Self {
        self.geometry_to_default_layer = enabled;
        self
    }

    /// Set whether to merge identical materials.
    #[must_use]
    pub const fn with_merge_materials(mut self, merge: bool) -> Self {
        self.merge_materials = merge;
        self
    }

    /// Set whether material merging ignores attributes.
    #[must_use]
    pub const fn with_merge_ignore_attributes(mut self, ignore: bool) -> Self {
        self.merge_ignore_attributes = ignore;
        self
    }

    /// Set whether to merge coplanar faces.
    #[must_use]
    pub const fn with_merge_coplanar_faces(mut self, merge: bool) -> Self {
        self.merge_coplanar_faces = merge;
        self
    }

    /// Set whether face merging ignores normal direction.
    #[must_use]
    pub const fn with_merge_ignore_normals(mut self, ignore: bool) -> Self {
        self.merge_ignore_normals = ignore;
        self
    }

    /// Set whether face merging ignores materials.
    #[must_use]
    pub const fn with_merge_ignore_materials(mut self, ignore: bool) -> Self {
        self.merge_ignore_materials = ignore;
        self
    }

    /// Set whether face merging ignores UV continuity.
    #[must_use]
    pub const fn with_merge_ignore_uv(mut self, ignore: bool) -> Self {
        self.merge_ignore_uv = ignore;
        self
    }

    /// Set whether to repair split edges.
    #[must_use]
    pub const fn with_repair_split_edges(mut self, repair: bool) -> Self {
        self.repair_split_edges = repair;
        self
    }

    /// Set whether to erase lonely edges.
    #[must_use]
    pub const fn with_erase_lonely_edges(mut self, erase: bool) -> Self {
        self.erase_lonely_edges = erase;
        self
    }

    /// Set whether to clear edge materials.
    #[must_use]
    pub const fn with_remove_edge_materials(mut self, remove: bool) -> Self {
        self.remove_edge_materials = remove;
        self
    }

    /// Set the smoothing angle in degrees.
    #[must_use]
    pub const fn with_smooth_angle(mut self, degrees: f64) -> Self {
        self.smooth_angle_degrees = degrees;
        self
    }

    /// Set the coplanarity tolerance.
    #[must_use]
    pub const fn with_coplanar_tolerance(mut self, tolerance: f64) -> Self {
        self.coplanar_tolerance = tolerance;
        self
    }

    /// Set the UV comparison tolerance.
    #[must_use]
    pub const fn with_uv_tolerance(mut self, tolerance: f64) -> Self {
        self.uv_tolerance = tolerance;
        self
    }

    /// Set the overlap test parameters.
    #[must_use]
    pub fn with_overlap(mut self, overlap: OverlapParams) -> Self {
        self.overlap = overlap;
        self
    }

    /// Set the orphan material handling.
    #[must_use]
    pub const fn with_orphan_materials(mut self, mode: OrphanMaterialMode) -> Self {
        self.orphan_materials = mode;
        self
    }

    /// Check numeric settings.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::InvalidConfig`] for negative or non-finite
    /// tolerances, a smoothing angle outside `[0, 180]`, or a non-positive
    /// probe offset.
    pub fn validate(&self) -> CleanupResult<()> {
        let angle = self.smooth_angle_degrees;
        if !angle.is_finite() || !(0.0..=180.0).contains(&angle) {
            return Err(CleanupError::config(format!(
                "smooth angle must be within [0, 180] degrees, got {angle}"
            )));
        }
        for (name, value) in [
            ("coplanar tolerance", self.coplanar_tolerance),
            ("uv tolerance", self.uv_tolerance),
            ("classify tolerance", self.overlap.classify_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CleanupError::config(format!("{name} must be a finite non-negative number, got {value}")));
            }
        }
        if !self.overlap.probe_offset.is_finite() || self.overlap.probe_offset <= 0.0 {
            return Err(CleanupError::config(format!(
                "probe offset must be positive, got {}",
                self.overlap.probe_offset
            )));
        }
        Ok(())
    }

    /// Parse a configuration snapshot. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// [`CleanupError::InvalidScope`] for an unknown scope tag, otherwise
    /// [`CleanupError::InvalidConfig`] for malformed JSON or bad values.
    ///
    /// # Example
    ///
    /// ```
    /// use scene_cleanup::{CleanupParams, Scope};
    ///
    /// let params = CleanupParams::from_json(r#"{"scope": "Selection", "mergeIgnoreUV": false}"#).unwrap();
    /// assert_eq!(params.scope, Scope::Selection);
    /// assert!(!params.merge_ignore_uv);
    /// assert!(params.purge_unused);
    /// ```
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> CleanupResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| CleanupError::config(e.to_string()))?;
        if let Some(scope) = value.get("scope") {
            let tag = scope
                .as_str()
                .ok_or_else(|| CleanupError::config("scope must be a string"))?;
            tag.parse::<Scope>()?;
        }
        let params: Self = serde_json::from_value(value).map_err(|e| CleanupError::config(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Serialize to pretty JSON using the same keys [`CleanupParams::from_json`] reads.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::InvalidConfig`] if serialization fails.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> CleanupResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CleanupError::config(e.to_string()))
    }
}
