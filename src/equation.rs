use std::fmt;

/// Upper and lower bound applied to [`EquationKind::Tangent`] near its asymptotes.
pub const TANGENT_LIMIT: f64 = 100.0;

/// Ceiling applied to [`EquationKind::Exponential`] so it never overflows to infinity.
pub const EXPONENTIAL_CEILING: f64 = 1e100;

/// The closed set of functions a user can listen to.
///
/// Labels that do not name one of these fall back to the default,
/// [`EquationKind::Sine`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EquationKind {
    #[default]
    Sine,
    Cosine,
    Tangent,
    Exponential,
    Logarithm,
    SquareRoot,
    Quadratic,
    Cubic,
}

impl EquationKind {
    /// All kinds, in menu order.
    pub const ALL: [EquationKind; 8] = [
        EquationKind::Sine,
        EquationKind::Cosine,
        EquationKind::Tangent,
        EquationKind::Exponential,
        EquationKind::Logarithm,
        EquationKind::SquareRoot,
        EquationKind::Quadratic,
        EquationKind::Cubic,
    ];

    /// The label shown in selectors.
    pub const fn label(self) -> &'static str {
        match self {
            EquationKind::Sine => "Sine",
            EquationKind::Cosine => "Cosine",
            EquationKind::Tangent => "Tangent",
            EquationKind::Exponential => "Exponential",
            EquationKind::Logarithm => "Logarithm",
            EquationKind::SquareRoot => "Square Root",
            EquationKind::Quadratic => "Quadratic",
            EquationKind::Cubic => "Cubic",
        }
    }

    /// Looks up a kind by label, ignoring case, whitespace, `-` and `_`.
    pub fn parse(label: &str) -> Option<Self> {
        let wanted = normalize(label);
        Self::ALL
            .into_iter()
            .find(|kind| normalize(kind.label()) == wanted)
    }

    /// Evaluates the function at `t`.
    ///
    /// Functions with singularities or overflow are guarded so the result is
    /// always finite for finite `t`.
    pub fn evaluate(self, t: f64) -> f64 {
        match self {
            EquationKind::Sine => t.sin(),
            EquationKind::Cosine => t.cos(),
            EquationKind::Tangent => t.tan().clamp(-TANGENT_LIMIT, TANGENT_LIMIT),
            EquationKind::Exponential => t.exp().min(EXPONENTIAL_CEILING),
            EquationKind::Logarithm => (t.abs() + 1.0).ln(),
            EquationKind::SquareRoot => t.abs().sqrt(),
            EquationKind::Quadratic => t.powi(2),
            EquationKind::Cubic => t.powi(3),
        }
    }
}

impl fmt::Display for EquationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
