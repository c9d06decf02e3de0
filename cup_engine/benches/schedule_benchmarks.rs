use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use cup_engine::{
    compute_standings, generate_fixtures, schedule_matches,
    tournament::{Category, Finish, Gender, Match, MatchResult, MatchStatus, Score, TeamId},
};
use std::hint::black_box;

fn teams(n: usize) -> Vec<TeamId> {
    (1..=n as TeamId).collect()
}

/// Benchmark round-robin generation for growing groups
fn bench_generate_fixtures(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_fixtures");

    for n_teams in [4, 8, 16, 32].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_teams", n_teams)),
            n_teams,
            |b, &n| {
                let teams = teams(n);
                b.iter(|| generate_fixtures(1, black_box(&teams)));
            },
        );
    }

    group.finish();
}

/// Benchmark the greedy scheduler; it is quadratic in the fixture count
fn bench_schedule_matches(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_matches");

    for n_teams in [4, 8, 16, 32].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_teams", n_teams)),
            n_teams,
            |b, &n| {
                let fixtures = generate_fixtures(1, &teams(n));
                b.iter(|| schedule_matches(black_box(&fixtures)));
            },
        );
    }

    group.finish();
}

/// Benchmark scheduling four parallel groups together
fn bench_schedule_category(c: &mut Criterion) {
    let mut fixtures = Vec::new();
    for group_id in 0..4 {
        let group_teams: Vec<TeamId> = (0..6).map(|i| group_id * 100 + i).collect();
        fixtures.extend(generate_fixtures(group_id, &group_teams));
    }

    c.bench_function("schedule_4_groups_of_6", |b| {
        b.iter(|| schedule_matches(black_box(&fixtures)));
    });
}

/// Benchmark standings over a fully played 16-team group
fn bench_compute_standings(c: &mut Criterion) {
    let team_ids = teams(16);
    let category = Category::new(1, Gender::Mixed);
    let mut matches = Vec::new();
    let mut results = Vec::new();

    for (i, fixture) in generate_fixtures(1, &team_ids).into_iter().enumerate() {
        let id = i as i64 + 1;
        let score = Score::new((i % 4) as u32, (i % 3) as u32);
        matches.push(Match {
            id,
            tournament_id: 1,
            category,
            group_id: Some(1),
            phase: None,
            home_team: fixture.home,
            away_team: fixture.away,
            status: MatchStatus::Finalized,
            order: id as u32,
            scheduled_at: None,
            score: Some(score),
            penalties: None,
        });

        let (home, away) = cup_engine::decide(score, None);
        for (team_id, finish) in [(fixture.home, home), (fixture.away, away)] {
            results.push(MatchResult {
                match_id: id,
                team_id,
                finish,
                points: match finish {
                    Finish::Winner => 3,
                    Finish::Draw => 1,
                    _ => 0,
                },
            });
        }
    }

    c.bench_function("standings_16_teams", |b| {
        b.iter(|| compute_standings(black_box(&team_ids), &matches, &results));
    });
}

criterion_group!(
    fixtures,
    bench_generate_fixtures,
    bench_schedule_matches,
    bench_schedule_category
);

criterion_group!(standings, bench_compute_standings);

criterion_main!(fixtures, standings);
