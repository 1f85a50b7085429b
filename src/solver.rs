//! Thin facade over a linear-inequality solver.
//!
//! Groups feed their alignment tabs in as variables and their size rules in
//! as constraints; [`LinearSpec::solve`] then settles the whole arrangement.
//! The solver is a warm-started constraint-projection loop: every sweep
//! projects the variable vector onto each violated constraint, soft
//! constraints first in ascending penalty order and hard constraints last,
//! so hard constraints hold exactly and conflicts are won by penalty rank.
//! Warm starts keep an already-valid layout untouched.

use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    fmt,
    rc::Rc,
};

/// Penalty of the max-size constraints; near-hard but never wedges the solver
pub const INEQUALITY_PENALTY: f64 = 10_000.;
/// Temporary boost for the dragged area's preferred size while solving
pub const HIGH_PENALTY: f64 = 100.;
/// Baseline cost of the preferred-size equality constraints
pub const EXTENT_PENALTY: f64 = 1.;

/// Largest value any variable may take; positions and sizes are clamped
/// here so the solver never runs into numerical overflow
pub(crate) const MAX_SOLVER_VALUE: f64 = 5e6;

/// Sweeps per [`LinearSpec::solve`] call; callers retry the whole call
const MAX_SWEEPS: usize = 100;
/// Residual below which a constraint counts as satisfied
const CONVERGED: f64 = 1e-6;
/// Largest violation a hard constraint may keep before the result is
/// declared infeasible
const HARD_TOLERANCE: f64 = 1e-3;

// ============================= Operator =============================
// ====================================================================

/// Relation between a constraint's left-hand side and its right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `lhs = rhs`
    Eq,
    /// `lhs ≤ rhs`
    Le,
    /// `lhs ≥ rhs`
    Ge,
}

/// Outcome of a [`LinearSpec::solve`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    /// All constraints settled
    Optimal,
    /// Hard constraints hold but soft residuals were still moving
    Suboptimal,
    /// A hard constraint could not be satisfied
    Infeasible,
}

// ============================= Variable =============================
// ====================================================================

/// A scalar the solver may adjust
#[derive(Debug)]
pub struct Variable {
    value: Cell<f64>,
    min:   Cell<f64>,
    max:   Cell<f64>,
}

impl Variable {
    fn new() -> Self {
        Self {
            value: Cell::new(0.),
            min:   Cell::new(f64::NEG_INFINITY),
            max:   Cell::new(f64::INFINITY),
        }
    }

    /// Current value
    pub fn value(&self) -> f64 {
        self.value.get()
    }

    /// Overwrite the value, clamped into the variable's range
    pub fn set_value(&self, value: f64) {
        self.value
            .set(value.clamp(self.min.get(), self.max.get()));
    }

    /// Restrict the range the solver may move this variable in
    pub fn set_range(&self, min: f64, max: f64) {
        self.min.set(min);
        self.max.set(max);
        self.set_value(self.value.get());
    }
}

// ============================ Constraint ============================
// ====================================================================

/// A single linear constraint over a set of variables.
///
/// `penalty_neg`/`penalty_pos` are the soft-violation costs below/above the
/// right-hand side; a constraint without penalties is hard.
pub struct Constraint {
    terms:       Vec<(f64, Rc<Variable>)>,
    op:          Operator,
    rhs:         Cell<f64>,
    penalty_neg: Cell<Option<f64>>,
    penalty_pos: Cell<Option<f64>>,
}

impl Constraint {
    /// The relation of this constraint
    pub fn op(&self) -> Operator {
        self.op
    }

    /// Current right-hand side
    pub fn rhs(&self) -> f64 {
        self.rhs.get()
    }

    /// Change the right-hand side without solving
    pub fn set_rhs(&self, rhs: f64) {
        self.rhs.set(rhs);
    }

    /// The current penalty pair
    pub fn penalties(&self) -> (Option<f64>, Option<f64>) {
        (self.penalty_neg.get(), self.penalty_pos.get())
    }

    /// Change the soft-violation costs
    pub fn set_penalties(&self, neg: Option<f64>, pos: Option<f64>) {
        self.penalty_neg.set(neg);
        self.penalty_pos.set(pos);
    }

    /// A constraint with no penalties must hold exactly
    pub fn is_hard(&self) -> bool {
        self.penalty_neg.get().is_none() && self.penalty_pos.get().is_none()
    }

    /// Does this constraint mention `variable`?
    pub(crate) fn involves(&self, variable: &Rc<Variable>) -> bool {
        self.terms.iter().any(|(_, v)| Rc::ptr_eq(v, variable))
    }

    /// Projection order; hard constraints rank last so they win
    fn rank(&self) -> f64 {
        if self.is_hard() {
            return f64::INFINITY;
        }
        self.penalty_neg
            .get()
            .unwrap_or(0.)
            .max(self.penalty_pos.get().unwrap_or(0.))
    }

    fn lhs(&self) -> f64 {
        self.terms
            .iter()
            .map(|(coefficient, variable)| coefficient * variable.value())
            .sum()
    }

    /// Signed correction needed on the left-hand side; zero when satisfied
    fn violation(&self) -> f64 {
        let error = self.rhs.get() - self.lhs();
        match self.op {
            Operator::Eq => error,
            Operator::Le => error.min(0.),
            Operator::Ge => error.max(0.),
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("terms", &self.terms.len())
            .field("op", &self.op)
            .field("rhs", &self.rhs.get())
            .field("penalty_neg", &self.penalty_neg.get())
            .field("penalty_pos", &self.penalty_pos.get())
            .finish()
    }
}

// ============================ LinearSpec ============================
// ====================================================================

/// Owner of one group's variables and constraints
#[derive(Debug, Default)]
pub struct LinearSpec {
    variables:   RefCell<Vec<Rc<Variable>>>,
    constraints: RefCell<Vec<Rc<Constraint>>>,
}

impl LinearSpec {
    /// Create an empty [`LinearSpec`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh variable with range `(-inf, +inf)`
    pub fn add_variable(&self) -> Rc<Variable> {
        let variable = Rc::new(Variable::new());
        self.variables.borrow_mut().push(Rc::clone(&variable));
        variable
    }

    /// Drop a variable together with every constraint mentioning it
    pub fn remove_variable(&self, variable: &Rc<Variable>) {
        self.constraints
            .borrow_mut()
            .retain(|c| !c.involves(variable));
        self.variables
            .borrow_mut()
            .retain(|v| !Rc::ptr_eq(v, variable));
    }

    /// Install a constraint `sum(coefficient * variable) op rhs`
    pub fn add_constraint(
        &self,
        terms: Vec<(f64, Rc<Variable>)>,
        op: Operator,
        rhs: f64,
        penalty_neg: Option<f64>,
        penalty_pos: Option<f64>,
    ) -> Rc<Constraint> {
        let constraint = Rc::new(Constraint {
            terms,
            op,
            rhs: Cell::new(rhs),
            penalty_neg: Cell::new(penalty_neg),
            penalty_pos: Cell::new(penalty_pos),
        });
        self.constraints.borrow_mut().push(Rc::clone(&constraint));
        constraint
    }

    /// Remove a constraint; the handle is dead afterwards
    pub fn remove_constraint(&self, constraint: &Rc<Constraint>) {
        self.constraints
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(c, constraint));
    }

    /// Number of live variables
    pub fn variable_count(&self) -> usize {
        self.variables.borrow().len()
    }

    /// Number of live constraints
    pub fn constraint_count(&self) -> usize {
        self.constraints.borrow().len()
    }

    /// Settle all variables.
    ///
    /// Returns [`SolveResult::Optimal`] once a sweep no longer moves any
    /// variable, [`SolveResult::Suboptimal`] when the sweep budget ran out
    /// first (callers simply call again), and [`SolveResult::Infeasible`]
    /// when a hard constraint still is violated at the end.
    pub fn solve(&self) -> SolveResult {
        let mut order = self.constraints.borrow().clone();
        if order.is_empty() {
            return SolveResult::Optimal;
        }
        order.sort_by(|a, b| a.rank().partial_cmp(&b.rank()).unwrap_or(Ordering::Equal));

        let variables = self.variables.borrow().clone();
        let mut settled = false;

        for _sweep in 0..MAX_SWEEPS {
            let before: Vec<f64> = variables.iter().map(|v| v.value()).collect();

            for constraint in &order {
                let error = constraint.violation();
                if error.abs() <= CONVERGED {
                    continue;
                }
                let norm: f64 = constraint.terms.iter().map(|(a, _)| a * a).sum();
                if norm <= f64::EPSILON {
                    continue;
                }
                for (coefficient, variable) in &constraint.terms {
                    variable.set_value(variable.value() + coefficient * error / norm);
                }
            }

            let moved = variables
                .iter()
                .zip(&before)
                .map(|(variable, old)| (variable.value() - old).abs())
                .fold(0_f64, f64::max);
            if moved <= CONVERGED {
                settled = true;
                break;
            }
        }

        let infeasible = order
            .iter()
            .any(|c| c.is_hard() && c.violation().abs() > HARD_TOLERANCE);
        if infeasible {
            return SolveResult::Infeasible;
        }

        if settled {
            SolveResult::Optimal
        } else {
            SolveResult::Suboptimal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LinearSpec, Operator, SolveResult, EXTENT_PENALTY, INEQUALITY_PENALTY};

    #[test]
    fn soft_equality_reaches_its_target() {
        let spec = LinearSpec::new();
        let x = spec.add_variable();

        spec.add_constraint(
            vec![(1., x.clone())],
            Operator::Eq,
            42.,
            Some(EXTENT_PENALTY),
            Some(EXTENT_PENALTY),
        );

        assert_eq!(spec.solve(), SolveResult::Optimal);
        assert!((x.value() - 42.).abs() < 1e-6);
    }

    #[test]
    fn chained_widths_follow_a_hard_anchor() {
        // [A|B]: left pinned, both widths preferred
        let spec = LinearSpec::new();
        let left = spec.add_variable();
        let middle = spec.add_variable();
        let right = spec.add_variable();

        spec.add_constraint(
            vec![(-1., left.clone()), (1., middle.clone())],
            Operator::Eq,
            300.,
            Some(EXTENT_PENALTY),
            Some(EXTENT_PENALTY),
        );
        spec.add_constraint(
            vec![(-1., middle.clone()), (1., right.clone())],
            Operator::Eq,
            200.,
            Some(EXTENT_PENALTY),
            Some(EXTENT_PENALTY),
        );
        spec.add_constraint(vec![(1., left.clone())], Operator::Eq, 100., None, None);

        assert_eq!(spec.solve(), SolveResult::Optimal);
        assert!((left.value() - 100.).abs() < 1e-3);
        assert!((middle.value() - 400.).abs() < 1e-3);
        assert!((right.value() - 600.).abs() < 1e-3);
    }

    #[test]
    fn higher_penalty_wins_a_conflict() {
        // preferred width 800 against a near-hard maximum of 600
        let spec = LinearSpec::new();
        let left = spec.add_variable();
        let right = spec.add_variable();

        spec.add_constraint(vec![(1., left.clone())], Operator::Eq, 0., None, None);
        spec.add_constraint(
            vec![(-1., left.clone()), (1., right.clone())],
            Operator::Eq,
            800.,
            Some(EXTENT_PENALTY),
            Some(EXTENT_PENALTY),
        );
        spec.add_constraint(
            vec![(-1., left.clone()), (1., right.clone())],
            Operator::Le,
            600.,
            Some(INEQUALITY_PENALTY),
            Some(INEQUALITY_PENALTY),
        );

        assert_eq!(spec.solve(), SolveResult::Optimal);
        assert!((right.value() - 600.).abs() < 1e-3);
    }

    #[test]
    fn conflicting_hard_constraints_are_infeasible() {
        let spec = LinearSpec::new();
        let x = spec.add_variable();

        spec.add_constraint(vec![(1., x.clone())], Operator::Eq, 1., None, None);
        spec.add_constraint(vec![(1., x)], Operator::Eq, 2., None, None);

        assert_eq!(spec.solve(), SolveResult::Infeasible);
    }

    #[test]
    fn satisfied_inequality_is_left_alone() {
        let spec = LinearSpec::new();
        let x = spec.add_variable();
        x.set_value(5.);

        spec.add_constraint(
            vec![(1., x.clone())],
            Operator::Le,
            10.,
            Some(INEQUALITY_PENALTY),
            Some(INEQUALITY_PENALTY),
        );

        assert_eq!(spec.solve(), SolveResult::Optimal);
        assert!((x.value() - 5.).abs() < 1e-9);
    }

    #[test]
    fn removing_a_variable_drops_its_constraints(){
        let spec = LinearSpec::new();
        let x = spec.add_variable();
        let y = spec.add_variable();

        spec.add_constraint(
            vec![(1., x.clone()), (-1., y.clone())],
            Operator::Eq,
            0.,
            None,
            None,
        );
        spec.add_constraint(vec![(1., y)], Operator::Eq, 3., None, None);
        assert_eq!(spec.constraint_count(), 2);

        spec.remove_variable(&x);
        assert_eq!(spec.variable_count(), 1);
        assert_eq!(spec.constraint_count(), 1);
    }
}
