pub(crate) use super::*;
use crate::graph::InteractionGraph;
use crate::sparse::CsrMatrix;

const INTERACTIONS: &[(usize, usize)] = &[(0, 0), (0, 1), (1, 1), (1, 2), (2, 3), (3, 0), (3, 4), (4, 2)];

fn graph() -> InteractionGraph {
    InteractionGraph::new(5, 5, INTERACTIONS).expect("valid")
}

fn config() -> GcnConfig {
    GcnConfig::default()
        .with_latent_dim(8)
        .and_then(|c| c.with_layers(3))
        .expect("valid")
        .with_seed(21)
}

fn model() -> LightGcn {
    LightGcn::new(config(), &graph()).expect("valid")
}

struct WrongSize;

impl SparseGraphProvider for WrongSize {
    fn n_users(&self) -> usize {
        2
    }

    fn n_items(&self) -> usize {
        2
    }

    fn sparse_graph(&self) -> Result<AdjacencyGraph> {
        Ok(AdjacencyGraph::Whole(CsrMatrix::identity(3)))
    }
}

// ========== Construction ==========

#[test]
fn test_new_starts_in_train_mode() {
    let mut m = model();
    assert_eq!(m.mode(), Mode::Train);
    m.eval();
    assert_eq!(m.mode(), Mode::Eval);
    m.train();
    assert_eq!(m.mode(), Mode::Train);
}

#[test]
fn test_same_seed_same_parameters() {
    assert_eq!(model().embeddings(), model().embeddings());
}

#[test]
fn test_random_init_sizes_from_provider() {
    let m = model();
    assert_eq!(m.n_users(), 5);
    assert_eq!(m.n_items(), 5);
    assert_eq!(m.embeddings().latent_dim(), 8);
    assert_eq!(m.assigner().groups(), 2);
}

#[test]
fn test_pretrained_tables_are_used() {
    let users = Matrix::ones(5, 8);
    let items = Matrix::zeros(5, 8);
    let m = LightGcn::new(config().with_pretrained(users.clone(), items.clone()), &graph()).expect("valid");
    assert_eq!(m.embeddings().users(), &users);
    assert_eq!(m.embeddings().items(), &items);
}

#[test]
fn test_pretrained_shape_mismatch() {
    let err = LightGcn::new(config().with_pretrained(Matrix::ones(4, 8), Matrix::zeros(5, 8)), &graph()).unwrap_err();
    assert!(matches!(err, GcnError::ShapeMismatch { .. }));
}

#[test]
fn test_provider_graph_size_checked() {
    let err = LightGcn::new(config(), &WrongSize).unwrap_err();
    assert!(matches!(err, GcnError::ShapeMismatch { .. }));
}

#[test]
fn test_invalid_config_rejected() {
    let bad = GcnConfig {
        groups: 0,
        ..config()
    };
    assert!(matches!(LightGcn::new(bad, &graph()), Err(GcnError::InvalidConfig { .. })));
}

// ========== Inference ==========

#[test]
fn test_users_rating_shape_and_range() {
    let mut m = model();
    m.eval();
    let r = m.users_rating(&[4, 0, 2], &mut StdRng::seed_from_u64(0)).expect("known users");
    assert_eq!(r.shape(), (3, 5));
    assert!(r.as_slice().iter().all(|&x| x > 0.0 && x < 1.0));
}

#[test]
fn test_eval_rating_is_deterministic() {
    let mut m = LightGcn::new(config().with_edge_dropout(0.5).expect("valid"), &graph()).expect("valid");
    m.eval();
    let a = m.users_rating(&[0, 1], &mut StdRng::seed_from_u64(1)).expect("valid");
    let b = m.users_rating(&[0, 1], &mut StdRng::seed_from_u64(2)).expect("valid");
    assert_eq!(a, b);
}

#[test]
fn test_forward_agrees_with_rating() {
    let mut m = model();
    m.eval();
    let mut rng = StdRng::seed_from_u64(0);
    let r = m.users_rating(&[1, 3], &mut rng).expect("valid");
    let f = m.forward(&[1, 3], &[2, 4], &mut rng).expect("valid");
    assert!((f[0] - r.get(0, 2)).abs() < 1e-6);
    assert!((f[1] - r.get(1, 4)).abs() < 1e-6);
}

#[test]
fn test_forward_is_sigmoid_of_propagated_dot() {
    let mut m = model();
    m.eval();
    let mut rng = StdRng::seed_from_u64(0);
    let (users, items) = m.computer(false, &mut rng).expect("valid");
    let f = m.forward(&[0, 4], &[1, 2], &mut rng).expect("valid");
    for (k, (&u, &i)) in [0usize, 4].iter().zip(&[1usize, 2]).enumerate() {
        let logit = crate::primitives::dot(users.row(u), items.row(i));
        assert!((f[k] - crate::nn::F::sigmoid(logit)).abs() < 1e-6);
    }
}

#[test]
fn test_forward_length_mismatch() {
    let m = model();
    let err = m.forward(&[0, 1], &[0], &mut StdRng::seed_from_u64(0)).unwrap_err();
    assert!(matches!(err, GcnError::ShapeMismatch { .. }));
}

#[test]
fn test_unknown_indices() {
    let m = model();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        m.users_rating(&[5], &mut rng),
        Err(GcnError::IndexOutOfRange { kind: "user", index: 5, len: 5 })
    ));
    assert!(matches!(
        m.embedding(&[0], &[0], &[7], &mut rng),
        Err(GcnError::IndexOutOfRange { kind: "item", index: 7, .. })
    ));
    assert!(m.contrastive_loss(&[9], &[0], &mut rng).is_err());
}

// ========== Training objectives ==========

#[test]
fn test_embedding_returns_propagated_and_ego_rows() {
    let mut m = model();
    m.eval();
    let mut rng = StdRng::seed_from_u64(0);
    let batch = m.embedding(&[0, 2], &[1, 3], &[4, 4], &mut rng).expect("valid");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.users_ego.row(1), m.embeddings().users().row(2));
    assert_eq!(batch.neg_ego.row(0), m.embeddings().items().row(4));

    let (users, items) = m.computer(false, &mut rng).expect("valid");
    assert_eq!(batch.users.row(0), users.row(0));
    assert_eq!(batch.pos.row(1), items.row(3));
}

#[test]
fn test_bpr_loss_finite_with_ego_regularizer() {
    let m = model();
    let mut rng = StdRng::seed_from_u64(3);
    let (loss, reg) = m.bpr_loss(&[0, 1, 2], &[0, 1, 3], &[4, 3, 0], &mut rng).expect("valid");
    assert!(loss.is_finite() && loss > 0.0);

    let s = m.embeddings();
    let expected = 0.5
        * (s.lookup_users(&[0, 1, 2]).expect("valid").squared_norm()
            + s.lookup_items(&[0, 1, 3]).expect("valid").squared_norm()
            + s.lookup_items(&[4, 3, 0]).expect("valid").squared_norm())
        / 3.0;
    assert!((reg - expected).abs() < 1e-5);
}

#[test]
fn test_bpr_loss_empty_batch() {
    let m = model();
    let err = m.bpr_loss(&[], &[], &[], &mut StdRng::seed_from_u64(0)).unwrap_err();
    assert!(matches!(err, GcnError::ShapeMismatch { .. }));
}

#[test]
fn test_contrastive_loss_is_finite_and_non_negative() {
    let m = model();
    let cl = m.contrastive_loss(&[0, 1, 2], &[0, 3], &mut StdRng::seed_from_u64(5)).expect("valid");
    assert!(cl.is_finite());
    assert!(cl >= 0.0);
    assert!((m.cl_rate() - 0.1).abs() < 1e-7);
}

#[test]
fn test_folded_provider_builds_and_scores() {
    let folded = graph().with_folds(2).expect("valid");
    let config = config().with_edge_dropout(0.7).expect("valid").with_split_adjacency(true);
    let mut m = LightGcn::new(config, &folded).expect("valid");
    assert!(matches!(m.graph(), AdjacencyGraph::Folds(_)));
    let (loss, _) = m.bpr_loss(&[0], &[0], &[2], &mut StdRng::seed_from_u64(0)).expect("valid");
    assert!(loss.is_finite());
    m.eval();
    assert!(m.users_rating(&[0], &mut StdRng::seed_from_u64(0)).is_ok());
}

#[test]
fn test_split_adjacency_requires_folds() {
    let err = LightGcn::new(config().with_split_adjacency(true), &graph()).unwrap_err();
    assert!(matches!(err, GcnError::InvalidConfig { ref param, .. } if param == "a_split"));
}

#[test]
fn test_folds_merged_without_split_adjacency() {
    let folded = graph().with_folds(3).expect("valid");
    let mut merged = LightGcn::new(config(), &folded).expect("valid");
    let mut whole = model();
    assert_eq!(merged.graph(), &AdjacencyGraph::Whole(graph().adjacency().clone()));

    merged.eval();
    whole.eval();
    let a = merged.users_rating(&[0, 3], &mut StdRng::seed_from_u64(0)).expect("valid");
    let b = whole.users_rating(&[0, 3], &mut StdRng::seed_from_u64(0)).expect("valid");
    assert_eq!(a, b);
}

#[test]
fn test_optimizer_access_changes_scores() {
    let mut m = model();
    m.eval();
    let mut rng = StdRng::seed_from_u64(0);
    let before = m.users_rating(&[0], &mut rng).expect("valid");
    for x in m.embeddings_mut().items_mut().as_mut_slice() {
        *x += 0.5;
    }
    let after = m.users_rating(&[0], &mut rng).expect("valid");
    assert_ne!(before, after);
}

#[test]
fn test_traced_pass_exposes_assignment() {
    let mut m = model();
    m.eval();
    let trace = m.computer_traced(false, &mut StdRng::seed_from_u64(0)).expect("valid");
    assert_eq!(trace.layers.len(), 3);
    assert_eq!(trace.assignment.labels().len(), 5);
    assert_eq!(trace.assignment.group_sizes().iter().sum::<usize>(), 5);
}
