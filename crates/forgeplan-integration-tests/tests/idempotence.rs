//! Property: auto-set inputs are a fixed point of the solve pipeline.
//!
//! For any satisfiable output request R: solve with no inputs, derive the
//! auto-set inputs I, re-solve with I. The second solve must be optimal
//! and derive exactly I again.

mod common;

use common::catalog;
use forgeplan_core::interpret::auto_set_inputs;
use forgeplan_core::request::{OutputTarget, SolverRequest};
use forgeplan_core::solver::solve_production;
use proptest::prelude::*;

proptest! {
    // Each case runs several LP solves; keep the count modest.
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn concrete_auto_set_inputs_are_a_fixed_point(amount in 1.0f64..400.0) {
        let catalog = catalog();
        let request = SolverRequest::for_output("Desc_Cement_C", amount);
        let first = solve_production(&catalog, &request).unwrap();
        prop_assert!(first.status.is_optimal());

        let inputs = auto_set_inputs(&first);
        let mut refed = request.clone();
        refed.inputs = inputs.clone();
        let second = solve_production(&catalog, &refed).unwrap();
        prop_assert!(second.status.is_optimal());
        prop_assert_eq!(auto_set_inputs(&second), inputs);
    }

    #[test]
    fn plastic_auto_set_inputs_are_a_fixed_point(amount in 1.0f64..200.0) {
        let catalog = catalog();
        let request = SolverRequest {
            outputs: vec![OutputTarget::exact("Desc_Plastic_C", amount)],
            ..SolverRequest::default()
        };
        let first = solve_production(&catalog, &request).unwrap();
        prop_assert!(first.status.is_optimal());

        let inputs = auto_set_inputs(&first);
        let mut refed = request.clone();
        refed.inputs = inputs.clone();
        let second = solve_production(&catalog, &refed).unwrap();
        prop_assert!(second.status.is_optimal());
        prop_assert_eq!(auto_set_inputs(&second), inputs);
        prop_assert_eq!(second.machines.len(), first.machines.len());
    }
}
