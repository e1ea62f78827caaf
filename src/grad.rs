//! Gradient definitions and their registry
use crate::{
    Color, Point, Properties, Scalar, SvgError, Transform, clamp, parse_length, parse_transform,
};
use std::{collections::HashMap, sync::Arc};

/// Gradient spread logic for the parameter smaller than 0 and greater than 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GradSpread {
    /// Use the same colors as the edge of the gradient
    #[default]
    Pad,
    /// Repeat gradient
    Repeat,
    /// Repeat gradient but alternate reflected and non reflected versions
    Reflect,
}

impl GradSpread {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pad" => Some(Self::Pad),
            "repeat" => Some(Self::Repeat),
            "reflect" => Some(Self::Reflect),
            _ => None,
        }
    }
}

/// Coordinate system of the gradient geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Units {
    /// Absolute coordinates of the user space of the painted shape
    UserSpaceOnUse,
    /// Fractions of the bounding box of the painted shape
    #[default]
    BoundingBox,
}

/// Specifies color at a particular parameter offset of the gradient
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GradStop {
    pub position: Scalar,
    pub color: Color,
}

impl GradStop {
    pub fn new(position: Scalar, color: Color) -> Self {
        Self { position, color }
    }

    /// Parse `stop` element, alpha is `stop-opacity` multiplied by `opacity`
    pub fn from_props(props: &Properties<'_, '_>, opacity: Scalar) -> Result<Self, SvgError> {
        let position = match props.get("offset") {
            None => 0.0,
            Some(offset) => parse_length("offset", offset)?,
        };
        let stop_opacity = match props.get("stop-opacity") {
            None => 1.0,
            Some(stop_opacity) => parse_length("stop-opacity", stop_opacity)?,
        };
        let color = match props.get("stop-color").map(str::parse::<Color>) {
            None => Color::TRANSPARENT,
            Some(Ok(color)) => color.with_opacity(stop_opacity * opacity),
            Some(Err(error)) => {
                tracing::warn!(%error, "invalid stop color, using transparent");
                Color::TRANSPARENT
            }
        };
        Ok(Self::new(clamp(position, 0.0, 1.0), color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GradientKind {
    Linear { start: Point, end: Point },
    Radial { center: Point, radius: Scalar },
}

/// Linear or radial gradient definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Gradient {
    id: String,
    kind: GradientKind,
    spread: GradSpread,
    units: Units,
    transform: Option<Transform>,
    stops: Vec<GradStop>,
    parent: Option<String>,
}

impl Gradient {
    pub fn new(id: impl Into<String>, kind: GradientKind) -> Self {
        Self {
            id: id.into(),
            kind,
            spread: GradSpread::default(),
            units: Units::default(),
            transform: None,
            stops: Vec::new(),
            parent: None,
        }
    }

    /// Parse `linearGradient` or `radialGradient` element, stops are added separately
    pub fn from_props(props: &Properties<'_, '_>) -> Result<Self, SvgError> {
        let element = props.element();
        let id = props.attribute("id").ok_or(SvgError::MissingAttribute("id"))?;
        let length = |name, default| Ok::<_, SvgError>(props.length(name)?.unwrap_or(default));
        let kind = match element.name() {
            "linearGradient" => GradientKind::Linear {
                start: Point::new(length("x1", 0.0)?, length("y1", 0.0)?),
                end: Point::new(length("x2", 1.0)?, length("y2", 0.0)?),
            },
            "radialGradient" => GradientKind::Radial {
                center: Point::new(length("cx", 0.0)?, length("cy", 0.0)?),
                radius: length("r", 0.0)?,
            },
            _ => {
                return Err(SvgError::InvalidAttribute {
                    name: "gradient",
                    value: element.name().to_owned(),
                });
            }
        };
        let mut gradient = Self::new(id, kind);
        if let Some(spread) = props.attribute("spreadMethod") {
            gradient.spread = GradSpread::from_name(spread).unwrap_or_else(|| {
                tracing::warn!(id, value = spread, "unknown spreadMethod");
                GradSpread::default()
            });
        }
        if let Some(units) = props.attribute("gradientUnits") {
            gradient.units = match units {
                "userSpaceOnUse" => Units::UserSpaceOnUse,
                "objectBoundingBox" => Units::BoundingBox,
                _ => {
                    tracing::warn!(id, value = units, "unknown gradientUnits");
                    Units::default()
                }
            };
        }
        gradient.transform = props.attribute("gradientTransform").map(parse_transform);
        gradient.parent = props
            .attribute("href")
            .map(|href| href.trim().trim_start_matches('#').to_owned())
            .filter(|parent| !parent.is_empty());
        Ok(gradient)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> GradientKind {
        self.kind
    }

    pub fn spread(&self) -> GradSpread {
        self.spread
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Local gradient transformation (`gradientTransform`)
    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    pub fn stops(&self) -> &[GradStop] {
        &self.stops
    }

    /// Identifier of the gradient this one inherits from
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Append stop, offsets are forced to be non-decreasing
    pub fn push_stop(&mut self, stop: GradStop) {
        let position = self
            .stops
            .last()
            .map_or(stop.position, |last| stop.position.max(last.position));
        self.stops.push(GradStop::new(position, stop.color));
    }

    // merge with resolved parent: own stops win, transforms compose
    fn inherit(mut self, parent: &Gradient) -> Self {
        if self.stops.is_empty() {
            self.stops = parent.stops.clone();
        }
        self.transform = match (parent.transform, self.transform) {
            (Some(parent), Some(child)) => Some(parent.pre_concat(child)),
            (parent, None) => parent,
            (None, child) => child,
        };
        self
    }
}

/// Collects gradient definitions and resolves inheritance between them
///
/// Definitions are finalized when the outermost `defs` closes, or immediately
/// if gradient is declared outside of `defs`. Only finalized gradients with at
/// least one stop are visible through [`GradientRegistry::get`].
#[derive(Debug, Default)]
pub(crate) struct GradientRegistry {
    defs_depth: usize,
    current: Option<Gradient>,
    defined: HashMap<String, Gradient>,
    pending: Vec<String>,
    resolved: HashMap<String, Option<Arc<Gradient>>>,
    /// Gradients inheriting from the key, re-resolved when the key is redefined
    dependents: HashMap<String, Vec<String>>,
}

impl GradientRegistry {
    pub(crate) fn enter_defs(&mut self) {
        self.defs_depth += 1;
    }

    pub(crate) fn leave_defs(&mut self) {
        self.defs_depth = self.defs_depth.saturating_sub(1);
        if self.defs_depth == 0 {
            self.finalize();
        }
    }

    /// Start collecting stops of the gradient
    pub(crate) fn begin_gradient(&mut self, gradient: Gradient) {
        if let Some(unfinished) = self.current.replace(gradient) {
            tracing::warn!(id = unfinished.id(), "nested gradient definition");
        }
    }

    /// Add stop to the currently open gradient
    pub(crate) fn add_stop(&mut self, stop: GradStop) {
        match &mut self.current {
            Some(gradient) => gradient.push_stop(stop),
            None => tracing::warn!("stop outside of gradient"),
        }
    }

    pub(crate) fn end_gradient(&mut self) {
        let Some(gradient) = self.current.take() else {
            return;
        };
        let id = gradient.id().to_owned();
        let mut stale = vec![id.clone()];
        while let Some(stale_id) = stale.pop() {
            self.resolved.remove(&stale_id);
            stale.extend(self.dependents.remove(&stale_id).unwrap_or_default());
            self.pending.push(stale_id);
        }
        self.defined.insert(id, gradient);
        if self.defs_depth == 0 {
            self.finalize();
        }
    }

    /// Finalized gradient by its identifier
    pub(crate) fn get(&self, id: &str) -> Option<Arc<Gradient>> {
        self.resolved.get(id).cloned().flatten()
    }

    fn finalize(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for id in pending {
            let mut chain = Vec::new();
            let gradient = self.resolve(&id, &mut chain);
            tracing::debug!(id, valid = gradient.is_some(), "gradient finalized");
        }
    }

    // resolve gradient inheritance, `chain` holds gradients being resolved
    fn resolve(&mut self, id: &str, chain: &mut Vec<String>) -> Option<Arc<Gradient>> {
        if let Some(resolved) = self.resolved.get(id) {
            return resolved.clone();
        }
        if let Some(index) = chain.iter().position(|link| link == id) {
            tracing::warn!(id, chain = ?&chain[index..], "gradient inheritance cycle");
            for link in chain.drain(index..) {
                self.resolved.insert(link, None);
            }
            return None;
        }
        let gradient = self.defined.get(id)?.clone();
        let gradient = match gradient.parent.clone() {
            None => gradient,
            Some(parent_id) => {
                chain.push(id.to_owned());
                let parent = self.resolve(&parent_id, chain);
                let dependents = self.dependents.entry(parent_id.clone()).or_default();
                if !dependents.iter().any(|dependent| dependent == id) {
                    dependents.push(id.to_owned());
                }
                chain.retain(|link| link != id);
                if let Some(resolved) = self.resolved.get(id) {
                    // part of a cycle
                    return resolved.clone();
                }
                match parent {
                    Some(parent) => gradient.inherit(&parent),
                    None => {
                        tracing::warn!(id, parent = parent_id, "unresolved gradient parent");
                        gradient
                    }
                }
            }
        };
        let resolved = if gradient.stops.is_empty() {
            tracing::warn!(id, "gradient without stops");
            None
        } else {
            Some(Arc::new(gradient))
        };
        self.resolved.insert(id.to_owned(), resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, assert_approx_eq};

    fn gradient(attributes: &[(&str, &str)], name: &str) -> Result<Gradient, SvgError> {
        let element = Element::new(name, attributes.iter().copied());
        Gradient::from_props(&Properties::new(&element))
    }

    fn stop(position: Scalar, color: &str) -> GradStop {
        GradStop::new(position, color.parse().unwrap())
    }

    #[test]
    fn test_grad_stops() -> Result<(), SvgError> {
        let mut grad = gradient(&[("id", "g")], "linearGradient")?;
        grad.push_stop(stop(0.0, "#ff0000"));
        grad.push_stop(stop(0.5, "#00ff00"));
        grad.push_stop(stop(0.2, "#0000ff"));
        assert_eq!(
            grad.stops().iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![0.0, 0.5, 0.5]
        );
        Ok(())
    }

    #[test]
    fn test_from_props() -> Result<(), SvgError> {
        let grad = gradient(&[("id", "l")], "linearGradient")?;
        assert_eq!(
            grad.kind(),
            GradientKind::Linear {
                start: Point::new(0.0, 0.0),
                end: Point::new(1.0, 0.0)
            }
        );
        assert_eq!(grad.spread(), GradSpread::Pad);
        assert_eq!(grad.units(), Units::BoundingBox);
        assert_eq!(grad.transform(), None);
        assert_eq!(grad.parent(), None);

        let grad = gradient(
            &[
                ("id", "r"),
                ("cx", "50%"),
                ("cy", "10"),
                ("r", "5px"),
                ("spreadMethod", "reflect"),
                ("gradientUnits", "userSpaceOnUse"),
                ("gradientTransform", "translate(1 2)"),
                ("href", "#base"),
            ],
            "radialGradient",
        )?;
        assert_eq!(
            grad.kind(),
            GradientKind::Radial {
                center: Point::new(0.5, 10.0),
                radius: 5.0
            }
        );
        assert_eq!(grad.spread(), GradSpread::Reflect);
        assert_eq!(grad.units(), Units::UserSpaceOnUse);
        assert_eq!(grad.transform(), Some(Transform::new_translate(1.0, 2.0)));
        assert_eq!(grad.parent(), Some("base"));

        assert!(gradient(&[], "linearGradient").is_err());
        assert!(gradient(&[("id", "x"), ("x1", "1cm")], "linearGradient").is_err());
        Ok(())
    }

    #[test]
    fn test_stop_from_props() -> Result<(), SvgError> {
        let element = Element::new(
            "stop",
            [
                ("offset", "40%"),
                ("style", "stop-color:#ff0000;stop-opacity:0.5"),
            ],
        );
        let stop = GradStop::from_props(&Properties::new(&element), 0.5)?;
        assert_approx_eq!(stop.position, 0.4);
        assert_eq!(stop.color, Color::new(255, 0, 0, 64));

        let element = Element::new("stop", [("offset", "2")]);
        let stop = GradStop::from_props(&Properties::new(&element), 1.0)?;
        assert_approx_eq!(stop.position, 1.0);
        assert_eq!(stop.color, Color::TRANSPARENT);

        // unknown color still produces a stop
        let element = Element::new("stop", [("offset", "1"), ("stop-color", "nocolor")]);
        let stop = GradStop::from_props(&Properties::new(&element), 1.0)?;
        assert_approx_eq!(stop.position, 1.0);
        assert_eq!(stop.color, Color::TRANSPARENT);
        Ok(())
    }

    #[test]
    fn test_registry_inheritance() -> Result<(), SvgError> {
        let mut registry = GradientRegistry::default();
        registry.enter_defs();

        // child is defined before its parent
        registry.begin_gradient(gradient(
            &[("id", "child"), ("href", "#base"), ("gradientTransform", "scale(2)")],
            "radialGradient",
        )?);
        registry.end_gradient();
        assert!(registry.get("child").is_none());

        registry.begin_gradient(gradient(
            &[("id", "base"), ("gradientTransform", "translate(10 0)")],
            "linearGradient",
        )?);
        registry.add_stop(stop(0.0, "red"));
        registry.add_stop(stop(1.0, "blue"));
        registry.end_gradient();

        registry.begin_gradient(gradient(&[("id", "empty")], "linearGradient")?);
        registry.end_gradient();

        registry.leave_defs();

        let base = registry.get("base").unwrap();
        let child = registry.get("child").unwrap();
        assert_eq!(child.stops(), base.stops());
        assert!(matches!(child.kind(), GradientKind::Radial { .. }));
        let p = child.transform().unwrap().apply(Point::new(1.0, 1.0));
        assert_approx_eq!(p.x(), 12.0);
        assert_approx_eq!(p.y(), 2.0);
        assert!(registry.get("empty").is_none());
        assert!(registry.get("missing").is_none());
        Ok(())
    }

    #[test]
    fn test_registry_cycle() -> Result<(), SvgError> {
        let mut registry = GradientRegistry::default();
        registry.enter_defs();
        registry.begin_gradient(gradient(&[("id", "a"), ("href", "#b")], "linearGradient")?);
        registry.end_gradient();
        registry.begin_gradient(gradient(&[("id", "b"), ("href", "#a")], "linearGradient")?);
        registry.add_stop(stop(0.0, "red"));
        registry.end_gradient();
        registry.begin_gradient(gradient(&[("id", "c"), ("href", "#c")], "linearGradient")?);
        registry.add_stop(stop(0.0, "red"));
        registry.end_gradient();
        registry.leave_defs();

        assert!(registry.get("a").is_none());
        assert!(registry.get("b").is_none());
        assert!(registry.get("c").is_none());
        Ok(())
    }

    #[test]
    fn test_registry_outside_defs() -> Result<(), SvgError> {
        let mut registry = GradientRegistry::default();
        registry.begin_gradient(gradient(&[("id", "a")], "linearGradient")?);
        registry.add_stop(stop(0.0, "red"));
        registry.end_gradient();
        assert_eq!(registry.get("a").map(|g| g.stops().len()), Some(1));

        // redefinition replaces the gradient
        registry.begin_gradient(gradient(&[("id", "a")], "linearGradient")?);
        registry.add_stop(stop(0.0, "red"));
        registry.add_stop(stop(1.0, "blue"));
        registry.end_gradient();
        assert_eq!(registry.get("a").map(|g| g.stops().len()), Some(2));
        Ok(())
    }

    #[test]
    fn test_registry_late_parent() -> Result<(), SvgError> {
        let mut registry = GradientRegistry::default();
        registry.begin_gradient(gradient(&[("id", "child"), ("href", "#base")], "linearGradient")?);
        registry.end_gradient();
        registry.begin_gradient(gradient(&[("id", "grand"), ("href", "#child")], "linearGradient")?);
        registry.end_gradient();
        assert!(registry.get("child").is_none());
        assert!(registry.get("grand").is_none());

        registry.begin_gradient(gradient(&[("id", "base")], "linearGradient")?);
        registry.add_stop(stop(0.0, "red"));
        registry.add_stop(stop(1.0, "blue"));
        registry.end_gradient();
        assert_eq!(registry.get("child").map(|g| g.stops().len()), Some(2));
        assert_eq!(registry.get("grand").map(|g| g.stops().len()), Some(2));
        Ok(())
    }
}
