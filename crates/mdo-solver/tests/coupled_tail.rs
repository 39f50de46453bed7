//! End-to-end: the tail lift / effective-angle loop of the elevator model,
//! solved and differentiated through the coupling group.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use mdo_aero::{defaults, elevator_model};
use mdo_graph::build_plan;
use mdo_solver::{SolveConfig, evaluate, evaluate_from, total_derivatives};

/// Closed-form fixed point of the two-module loop. With
/// k = 2 pi AR e / (AR e + 2) and d = 1 / (pi AR e):
/// alphaT = n / (1 + k d), tailCL = k alphaT.
fn closed_form_tail_state() -> (f64, f64) {
    let ar = defaults::TAIL_SPAN / defaults::TAIL_CHORD;
    let e_t = defaults::TAIL_SPANWISE_EFFICIENCY;
    let are = ar * e_t;
    let k = 2.0 * PI * are / (are + 2.0);
    let d = 1.0 / (PI * ar * e_t);
    let eps_a = defaults::D_CL_D_ALPHA
        / (PI * defaults::WING_AR * defaults::WING_SPANWISE_EFFICIENCY);
    let n = (1.0 - eps_a) * defaults::ALPHA
        + eps_a * defaults::ALPHA_ZERO_LIFT
        + defaults::TAIL_ANGLE;
    let alpha_t = n / (1.0 + k * d);
    (k * alpha_t, alpha_t)
}

#[test]
fn tail_loop_converges_to_closed_form() {
    let model = elevator_model().unwrap();
    let plan = build_plan(&model).unwrap();
    let eval = evaluate(&model, &plan, &SolveConfig::default()).unwrap();

    let (cl_t, alpha_t) = closed_form_tail_state();
    assert_relative_eq!(
        eval.value(model.lookup("tailCL").unwrap()),
        cl_t,
        max_relative = 1e-8
    );
    assert_relative_eq!(
        eval.value(model.lookup("alphaT").unwrap()),
        alpha_t,
        max_relative = 1e-8
    );

    let stats = eval.group_stats();
    assert_eq!(stats.len(), 1);
    assert!(stats[0].iterations <= 100);
    assert!(stats[0].residual_norm < 1e-10);
}

#[test]
fn repeat_evaluation_is_deterministic() {
    let model = elevator_model().unwrap();
    let plan = build_plan(&model).unwrap();
    let config = SolveConfig::default();
    let a = evaluate(&model, &plan, &config).unwrap();
    let b = evaluate(&model, &plan, &config).unwrap();
    assert_eq!(a.values(), b.values(), "bitwise identical repeat run");
}

#[test]
fn totals_match_perturb_and_resolve() {
    let model = elevator_model().unwrap();
    let plan = build_plan(&model).unwrap();
    let config = SolveConfig::default();
    let eval = evaluate(&model, &plan, &config).unwrap();

    let drag = model.lookup("totalDrag").unwrap();
    let of = [
        drag,
        model.lookup("verticalForce").unwrap(),
        model.lookup("tailCL").unwrap(),
    ];
    let wrt = [
        model.lookup("tailAngle").unwrap(),
        model.lookup("tailSpan").unwrap(),
        model.lookup("alpha").unwrap(),
    ];
    let totals = total_derivatives(&model, &plan, eval.values(), &of, &wrt).unwrap();

    let h = 1e-6;
    for (j, &x) in wrt.iter().enumerate() {
        let mut perturbed = model.initial_values();
        perturbed[x.index() as usize] += h;
        let plus = evaluate_from(&model, &plan, perturbed, &config).unwrap();
        for (i, &y) in of.iter().enumerate() {
            let fd = (plus.value(y) - eval.value(y)) / h;
            assert_relative_eq!(totals[(i, j)], fd, max_relative = 1e-4, epsilon = 1e-8);
        }
    }
}

#[test]
fn tail_response_to_setting_angle_matches_theory() {
    // d(tailCL)/d(tailAngle) through the loop is k / (1 + k d).
    let model = elevator_model().unwrap();
    let plan = build_plan(&model).unwrap();
    let eval = evaluate(&model, &plan, &SolveConfig::default()).unwrap();

    let ar = defaults::TAIL_SPAN / defaults::TAIL_CHORD;
    let e_t = defaults::TAIL_SPANWISE_EFFICIENCY;
    let are = ar * e_t;
    let k = 2.0 * PI * are / (are + 2.0);
    let d = 1.0 / (PI * ar * e_t);

    let cl = model.lookup("tailCL").unwrap();
    let angle = model.lookup("tailAngle").unwrap();
    let totals = total_derivatives(&model, &plan, eval.values(), &[cl], &[angle]).unwrap();
    assert_relative_eq!(totals[(0, 0)], k / (1.0 + k * d), max_relative = 1e-8);
}
