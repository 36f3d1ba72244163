use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fuzzowl_core::{Expression, MilpModel, MilpSolver, SimplexSolver};

/// Chain of Gödel-style disjunctions: z_i <= x_i + 1 - y_i, z_i <= x_{i+1} + y_i
fn create_disjunction_chain(size: usize) -> MilpModel {
    let mut model = MilpModel::new();
    let mut objective = Expression::zero();
    for i in 0..size {
        let x = model.get_variable(&format!("a{}:A", i));
        let next = model.get_variable(&format!("a{}:A", i + 1));
        let z = model.get_variable(&format!("a{}:B", i));
        let y = model.new_binary();
        model.add_le(z, Expression::from(x) + 1.0 - y);
        model.add_le(z, Expression::from(next) + y);
        model.add_le(x, 0.1 + (i % 7) as f64 / 10.0);
        objective = objective - z;
    }
    model.set_objective(Some(objective));
    model
}

fn benchmark_lp_relaxation(c: &mut Criterion) {
    for size in [5, 10, 20] {
        let mut model = MilpModel::new();
        let mut objective = Expression::zero();
        for i in 0..size {
            let x = model.get_variable(&format!("x{}", i));
            let y = model.get_variable(&format!("y{}", i));
            model.add_le(Expression::from(x) + y, 1.0);
            model.add_ge(x, 0.05 * i as f64 / size as f64);
            objective = objective - x - y;
        }
        model.set_objective(Some(objective));
        c.bench_function(&format!("lp_relaxation_{}_pairs", size), |b| {
            let solver = SimplexSolver::default();
            b.iter(|| solver.optimize(black_box(&model.problem())).unwrap());
        });
    }
}

fn benchmark_branch_and_bound(c: &mut Criterion) {
    for size in [4, 8, 12] {
        let model = create_disjunction_chain(size);
        c.bench_function(&format!("branch_and_bound_{}_binaries", size), |b| {
            let solver = SimplexSolver::default();
            b.iter(|| model.solve(black_box(&solver)).unwrap());
        });
    }
}

criterion_group!(benches, benchmark_lp_relaxation, benchmark_branch_and_bound);
criterion_main!(benches);
