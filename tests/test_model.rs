#![cfg(test)]

use benders_mdp::{Action, DecompositionOptionsBuilder, Error, MdpModel, State, TabularMdp, decompose,
    MODEL_FILE, SOLUTION_FILE};

fn toy() -> TabularMdp {
    TabularMdp::from_dense(
        &[
            vec![vec![0.9, 0.1], vec![0.5, 0.5]],
            vec![vec![0.2, 0.8], vec![0.1, 0.9]],
        ],
        &[vec![1.0, 0.0], vec![0.0, 2.0]],
        &[0.5, 0.5],
        0.9)
}

fn is_malformed(mdp: &TabularMdp) -> bool {
    matches!(MdpModel::new(mdp), Err(Error::MalformedInstance(_)))
}

#[test]
fn the_toy_is_well_formed() {
    assert!(MdpModel::new(&toy()).is_ok());
}

#[test]
fn a_row_that_does_not_sum_to_one_is_malformed() {
    let mut mdp = toy();
    mdp.set_transition(State(1), Action(0), State(1), 0.4);
    assert!(is_malformed(&mdp));
}

#[test]
fn a_negative_probability_is_malformed() {
    let mut mdp = toy();
    mdp.set_transition(State(0), Action(1), State(0), -0.2);
    mdp.set_transition(State(0), Action(1), State(1), 1.2);
    assert!(is_malformed(&mdp));
}

#[test]
fn a_discount_of_one_is_malformed() {
    let mut mdp = toy();
    mdp.set_discount(1.0);
    assert!(is_malformed(&mdp));
}

#[test]
fn an_invalid_initial_distribution_is_malformed() {
    let mut mdp = toy();
    mdp.set_initial(State(0), 0.7);
    assert!(is_malformed(&mdp));
}

#[test]
fn a_non_finite_reward_is_malformed() {
    let mut mdp = toy();
    mdp.set_reward(State(1), Action(1), f64::NAN);
    assert!(is_malformed(&mdp));
}

#[test]
fn an_empty_action_set_is_malformed() {
    let mdp = TabularMdp::new(2, 0, 0.9);
    assert!(is_malformed(&mdp));
}

#[test]
fn the_master_and_its_solution_are_persisted() {
    let dir     = tempfile::tempdir().unwrap();
    let model   = MdpModel::new(&toy()).unwrap();
    let options = DecompositionOptionsBuilder::default()
        .output_dir(dir.path())
        .build()
        .unwrap();
    let outcome = decompose(&model, &options).unwrap();

    let lp = std::fs::read_to_string(dir.path().join(MODEL_FILE)).unwrap();
    assert!(lp.starts_with("\\ master relaxation"));
    assert!(lp.contains("Subject To"));
    assert_eq!(outcome.nb_cuts, lp.matches(" cut_s").count());

    let json = std::fs::read_to_string(dir.path().join(SOLUTION_FILE)).unwrap();
    let solution: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(outcome.iterations as u64, solution["iterations"].as_u64().unwrap());
    assert_eq!(vec![0, 1], solution["policy"].as_array().unwrap().iter()
        .map(|a| a.as_u64().unwrap()).collect::<Vec<_>>());
    assert!((outcome.objective - solution["objective"].as_f64().unwrap()).abs() < 1e-12);
}
