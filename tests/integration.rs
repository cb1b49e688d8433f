//! Integration tests for the LightGCN recommender.
//!
//! These tests verify end-to-end passes combining graph, embeddings, groups,
//! propagation and scoring.

use lightgcn::prelude::*;
use lightgcn::recommend::{GroupAssignment, SubgraphBuilder};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn assert_close(a: &Matrix<f32>, b: &Matrix<f32>, tol: f32) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert!((x - y).abs() <= tol, "{x} vs {y}");
    }
}

fn movielens_like() -> InteractionGraph {
    let interactions: Vec<(usize, usize)> = (0..12)
        .flat_map(|u| [(u, u % 9), (u, (u * 5 + 2) % 9), (u, (u + 4) % 9)])
        .collect();
    InteractionGraph::new(12, 9, &interactions).expect("indices in range")
}

#[test]
fn test_identity_graph_reproduces_embeddings() {
    init_tracing();
    let users = Matrix::from_vec(2, 3, vec![0.1, -0.2, 0.3, 0.4, 0.5, -0.6]).unwrap();
    let items = Matrix::from_vec(3, 3, vec![1.0, 0.0, -1.0, 0.2, 0.2, 0.2, -0.7, 0.9, 0.0]).unwrap();
    let provider = PrebuiltGraph::new(2, 3, AdjacencyGraph::Whole(CsrMatrix::identity(5))).unwrap();
    let config = GcnConfig::default()
        .with_latent_dim(3)
        .and_then(|c| c.with_layers(2))
        .and_then(|c| c.with_groups(1))
        .expect("valid")
        .with_pretrained(users.clone(), items.clone())
        .with_seed(0);

    let mut model = LightGcn::new(config, &provider).expect("valid model");
    model.eval();
    let (u, i) = model.computer(false, &mut StdRng::seed_from_u64(0)).unwrap();
    assert_close(&u, &users, 1e-6);
    assert_close(&i, &items, 1e-6);
}

#[test]
fn test_two_groups_isolate_users_and_share_items() {
    // u0-i0, u1-i0, u1-i1
    let graph = InteractionGraph::new(2, 2, &[(0, 0), (1, 0), (1, 1)]).unwrap();
    let base = graph.adjacency();
    let assignment = GroupAssignment::from_labels(vec![0, 1], 2, 2).unwrap();
    let subgraphs = SubgraphBuilder::build_all(base, &assignment).unwrap();

    // group 0: only u0's edge survives
    assert!(subgraphs[0].get(0, 2) > 0.0);
    assert!(subgraphs[0].get(2, 0) > 0.0);
    assert_eq!(subgraphs[0].row(1).0.len(), 0);
    assert_eq!(subgraphs[0].get(2, 1), 0.0);
    assert_eq!(subgraphs[0].nnz(), 2);

    // group 1: u1's edges, item 0 still present
    assert_eq!(subgraphs[1].row(0).0.len(), 0);
    assert!(subgraphs[1].get(1, 2) > 0.0);
    assert!(subgraphs[1].get(2, 1) > 0.0);
    assert!(subgraphs[1].get(3, 1) > 0.0);
    assert_eq!(subgraphs[1].nnz(), 4);

    // weights are the base weights, unchanged
    assert_eq!(subgraphs[0].get(0, 2), base.get(0, 2));
    assert_eq!(subgraphs[1].get(3, 1), base.get(3, 1));
}

#[test]
fn test_eval_pass_is_deterministic() {
    init_tracing();
    let config = GcnConfig::default()
        .with_latent_dim(16)
        .and_then(|c| c.with_edge_dropout(0.6))
        .expect("valid")
        .with_seed(11);
    let mut model = LightGcn::new(config, &movielens_like()).unwrap();
    model.eval();
    let a = model.computer(false, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = model.computer(false, &mut StdRng::seed_from_u64(2)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_train_pass_samples_dropout() {
    let config = GcnConfig::default()
        .with_latent_dim(16)
        .and_then(|c| c.with_edge_dropout(0.5))
        .expect("valid")
        .with_seed(11);
    let model = LightGcn::new(config, &movielens_like()).unwrap();
    let a = model.computer(false, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = model.computer(false, &mut StdRng::seed_from_u64(2)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_keep_prob_one_equals_no_dropout() {
    let base = GcnConfig::default()
        .with_latent_dim(8)
        .and_then(|c| c.with_group_dropout(0.0))
        .expect("valid")
        .with_seed(4);
    let with = LightGcn::new(base.clone().with_edge_dropout(1.0).unwrap(), &movielens_like()).unwrap();
    let without = LightGcn::new(base, &movielens_like()).unwrap();
    assert_eq!(with.mode(), Mode::Train);

    let x = with.computer(false, &mut StdRng::seed_from_u64(9)).unwrap();
    let y = without.computer(false, &mut StdRng::seed_from_u64(9)).unwrap();
    assert_close(&x.0, &y.0, 1e-6);
    assert_close(&x.1, &y.1, 1e-6);
}

#[test]
fn test_five_layer_default_is_mean_of_layers() {
    let mut model = LightGcn::new(GcnConfig::default().with_seed(2), &movielens_like()).unwrap();
    model.eval();
    let trace = model.computer_traced(false, &mut StdRng::seed_from_u64(0)).unwrap();
    assert_eq!(trace.layers.len(), 5);

    let mut mean = Matrix::zeros(21, 64);
    for layer in &trace.layers {
        mean.add_scaled(layer, 0.2).unwrap();
    }
    let (u, i) = model.embeddings().split(&mean).unwrap();
    assert_close(&trace.users, &u, 1e-6);
    assert_close(&trace.items, &i, 1e-6);
}

#[test]
fn test_zero_embeddings_give_ln2_loss() {
    let graph = movielens_like();
    let config = GcnConfig::default()
        .with_latent_dim(4)
        .expect("valid")
        .with_pretrained(Matrix::zeros(12, 4), Matrix::zeros(9, 4))
        .with_seed(0);
    let model = LightGcn::new(config, &graph).unwrap();
    let (loss, reg) = model
        .bpr_loss(&[0, 5, 11], &[0, 3, 2], &[8, 1, 4], &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert!((loss - std::f32::consts::LN_2).abs() < 1e-6);
    assert_eq!(reg, 0.0);
}

#[test]
fn test_training_step_shapes_with_contrastive_term() {
    init_tracing();
    let model = LightGcn::new(
        GcnConfig::default()
            .with_latent_dim(16)
            .and_then(|c| c.with_groups(3))
            .and_then(|c| c.with_edge_dropout(0.8))
            .expect("valid")
            .with_split_adjacency(true)
            .with_seed(8),
        &movielens_like().with_folds(4).unwrap(),
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let users = [0, 3, 6, 9];
    let pos = [0, 2, 6, 0];
    let neg = [1, 7, 3, 5];
    let (loss, reg) = model.bpr_loss(&users, &pos, &neg, &mut rng).unwrap();
    let cl = model.contrastive_loss(&users, &pos, &mut rng).unwrap();
    let total = loss + 1e-4 * reg + model.cl_rate() * cl;
    assert!(total.is_finite());
}

#[test]
fn test_pure_mf_shares_surface() {
    fn top_item<M: Recommender>(model: &M, user: usize) -> usize {
        let ratings = model.users_rating(&[user], &mut StdRng::seed_from_u64(0)).unwrap();
        let row = ratings.row(0);
        lightgcn::recommend::argmax_first(row)
    }

    let graph = movielens_like();
    let config = GcnConfig::default().with_latent_dim(8).unwrap().with_seed(6);
    let mf = PureMf::new(&config, &graph).unwrap();
    let mut gcn = LightGcn::new(config, &graph).unwrap();
    gcn.eval();
    assert!(top_item(&mf, 0) < 9);
    assert!(top_item(&gcn, 0) < 9);
}

#[test]
fn test_model_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    GcnConfig::default()
        .with_latent_dim(8)
        .and_then(|c| c.with_layers(3))
        .unwrap()
        .with_seed(5)
        .save(&path)
        .unwrap();

    let config = GcnConfig::load(&path).unwrap();
    let a = LightGcn::new(config.clone(), &movielens_like()).unwrap();
    let b = LightGcn::new(config, &movielens_like()).unwrap();
    assert_eq!(a.embeddings(), b.embeddings());
    assert_eq!(a.config().n_layers, 3);
}
