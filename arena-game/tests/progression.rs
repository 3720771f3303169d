use arena_game::{
    ChestDefinition, ChestEngine, ChestError, GameConfig, GameSession, PlayerLedger, Rarity,
    RarityConfig, RarityWeight, RewardTable, StartingState, TierDefinition, ValueDistribution,
    check_and_advance,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use std::time::Duration;

fn two_tier_table() -> Vec<TierDefinition> {
    vec![
        TierDefinition::new(1, 0, 0),
        TierDefinition::new(2, 100_000, 50_000),
    ]
}

fn wooden_only() -> GameConfig {
    GameConfig {
        rewards: RewardTable {
            rarities: vec![
                RarityConfig {
                    rarity: Rarity::Common,
                    min_cents: 58,
                    max_cents: 876,
                    names: vec!["Knight".to_string(), "Archers".to_string()],
                },
                RarityConfig {
                    rarity: Rarity::Rare,
                    min_cents: 877,
                    max_cents: 2_895,
                    names: vec!["Musketeer".to_string()],
                },
            ],
            value_distribution: ValueDistribution::Triangular,
            chests: vec![ChestDefinition::weighted(
                "Wooden Chest",
                1_500,
                1,
                vec![
                    RarityWeight::new(Rarity::Common, 85.0),
                    RarityWeight::new(Rarity::Rare, 15.0),
                ],
            )],
        },
        tiers: two_tier_table(),
        upgrades: Vec::new(),
        starting: StartingState::default(),
    }
}

#[test]
fn wooden_chest_scenario() {
    let config = wooden_only();
    config.validate().unwrap();
    let mut ledger = PlayerLedger::new(&StartingState {
        balance_cents: 2_000,
        ..StartingState::default()
    });
    let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);

    let item = ChestEngine::new(&config)
        .open("Wooden Chest", &mut ledger, &mut rng)
        .unwrap();

    assert_eq!(ledger.balance_cents(), 500);
    assert_eq!(ledger.counters().chests_opened, 1);
    assert_eq!(ledger.collection().len(), 1);
    assert!(matches!(item.rarity, Rarity::Common | Rarity::Rare));

    // A second open cannot be afforded and changes nothing.
    let before = ledger.clone();
    assert!(matches!(
        ChestEngine::new(&config).open("Wooden Chest", &mut ledger, &mut rng),
        Err(ChestError::InsufficientFunds { .. })
    ));
    assert_eq!(ledger, before);
}

#[test]
fn single_tier_unlock_scenario() {
    let config = wooden_only();
    let mut ledger = PlayerLedger::default();
    ledger.earn(100_000);
    let balance = ledger.balance_cents();

    let events = check_and_advance(&mut ledger, &config.tiers, &config.rewards);

    assert_eq!(events.len(), 1);
    assert_eq!((events[0].tier, events[0].reward_cents), (2, 50_000));
    assert_eq!(ledger.balance_cents(), balance + 50_000);
    assert_eq!(ledger.current_tier(), 2);
    assert!(ledger.claimed_tiers().contains(&2));
    assert_eq!(ledger.claimed_tiers().len(), 1);
}

#[test]
fn one_huge_tick_grants_every_intervening_tier_in_order() {
    let config = Arc::new(GameConfig::default_config());
    let mut session = GameSession::new(Arc::clone(&config), 77);
    for _ in 0..20 {
        session.click();
    }
    session.buy_upgrade("Auto Clicker I").unwrap();

    // 50 cents/s for 60,000 s crosses arenas 2 through 5 at once.
    let outcome = session.tick(Duration::from_secs(60_000));

    let tiers: Vec<u32> = outcome.unlocks.iter().map(|event| event.tier).collect();
    assert_eq!(tiers, vec![2, 3, 4, 5]);
    let rewards: i64 = outcome.unlocks.iter().map(|event| event.reward_cents).sum();
    assert_eq!(rewards, 50_000 + 100_000 + 200_000 + 400_000);
    assert_eq!(session.ledger().balance_cents(), 3_000_000 + rewards);
    assert_eq!(session.ledger().current_tier(), 5);

    // Reward money never counts as earnings, so nothing cascades further.
    assert_eq!(session.ledger().lifetime_earned_cents(), 3_002_000);
    assert!(session.check_progression().is_empty());
}

#[test]
fn guaranteed_reward_chests_arrive_with_their_tier() {
    let config = Arc::new(GameConfig::default_config());
    let mut ledger = PlayerLedger::new(&config.starting);
    ledger.earn(1_000_000_000);

    let events = check_and_advance(&mut ledger, &config.tiers, &config.rewards);
    assert_eq!(events.len(), 24);
    let legendary = events.iter().find(|event| event.tier == 15).unwrap();
    assert_eq!(legendary.reward_chests, ["Guaranteed Legendary".to_string()]);
    let champion = events.iter().find(|event| event.tier == 20).unwrap();
    assert_eq!(champion.reward_chests, ["Guaranteed Champion".to_string()]);

    let mut session = GameSession::from_ledger(config, ledger, 3);
    let item = session.open_chest("Guaranteed Champion").unwrap();
    assert_eq!(item.rarity, Rarity::Champion);
    assert_eq!(
        session.open_chest("Guaranteed Champion"),
        Err(ChestError::NoRewardChest("Guaranteed Champion".to_string()))
    );
    assert_eq!(
        session.ledger().reward_chests(),
        ["Guaranteed Legendary".to_string()]
    );
}

#[test]
fn chests_unlock_with_arenas() {
    let mut session = GameSession::new(Arc::new(GameConfig::default_config()), 12);
    for _ in 0..200 {
        session.click();
    }
    assert_eq!(
        session.open_chest("Silver Chest"),
        Err(ChestError::ChestLocked {
            chest: "Silver Chest".to_string(),
            required_tier: 2,
            current_tier: 1,
        })
    );
    for _ in 0..800 {
        session.click();
    }
    assert!(session.open_chest("Silver Chest").is_ok());
    let names: Vec<&str> = session
        .available_chests()
        .iter()
        .map(|chest| chest.name.as_str())
        .collect();
    assert_eq!(names, ["Wooden Chest", "Silver Chest"]);
}

#[test]
fn selling_never_feeds_progression() {
    let mut session = GameSession::new(Arc::new(GameConfig::default_config()), 8);
    for _ in 0..900 {
        session.click();
    }
    let ids: Vec<_> = (0..50)
        .map(|_| session.open_chest("Wooden Chest").unwrap().id)
        .collect();
    let lifetime = session.ledger().lifetime_earned_cents();
    for id in ids {
        session.sell(id).unwrap();
    }
    assert_eq!(session.ledger().lifetime_earned_cents(), lifetime);
    assert_eq!(session.ledger().counters().items_sold, 50);
    assert!(session.ledger().collection().is_empty());
    assert!(session.check_progression().is_empty());
    assert_eq!(session.ledger().current_tier(), 1);
}
