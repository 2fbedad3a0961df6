//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use carelog_core::{
  Error as CoreError,
  commit::{CommitEngine, LogContext},
  controller::{StepAction, StepController, StepEffect},
  draft::WizardDraft,
  observation::{
    Category, FoodIntake, IntakeLevel, LiquidChoice, LiquidIntake, MealWindow, Observation,
    ObservationRow, UrineChoice, UrineOutput, VitalsReading,
  },
  schedule::{self, Position},
  store::{AuditSink, NewAuditEntry, ObservationStore, ReplacePlan, Replacement},
  validate::ObservationFields,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> Arc<SqliteStore> {
  Arc::new(
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store"),
  )
}

fn context() -> LogContext {
  LogContext {
    resident_id: Uuid::new_v4(),
    user_id:     Uuid::new_v4(),
    day:         NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
  }
}

fn vitals(systolic: i32) -> Observation {
  Observation::Vitals(VitalsReading { systolic, diastolic: 80, pulse: 70 })
}

fn meal_fields() -> ObservationFields {
  ObservationFields {
    intake_level: Some("100%".into()),
    liquid_intake: Some("Yes".into()),
    bowel_size: Some("Medium".into()),
    bowel_consistency: Some("Soft".into()),
    urine_output: Some("Yes".into()),
    ..Default::default()
  }
}

/// Make every insert into `table` for `meal` abort.
async fn fail_inserts(s: &SqliteStore, table: &'static str, meal: &'static str) {
  s.conn
    .call(move |conn| {
      conn.execute_batch(&format!(
        "CREATE TRIGGER fail_{table}_{meal} BEFORE INSERT ON {table}
         WHEN NEW.meal_window = '{meal}'
         BEGIN SELECT RAISE(ABORT, 'simulated storage failure'); END;"
      ))?;
      Ok(())
    })
    .await
    .unwrap();
}

// ─── Replace ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_inserts_and_reads_back() {
  let s = store().await;
  let ctx = context();

  let plan = ReplacePlan {
    resident_id:  ctx.resident_id,
    date:         ctx.day,
    replacements: vec![
      Replacement {
        meal:     MealWindow::Breakfast,
        category: Category::Vitals,
        rows:     vitals(118).rows(),
      },
      Replacement {
        meal:     MealWindow::Lunch,
        category: Category::Food,
        rows:     vec![ObservationRow::Food(FoodIntake {
          intake_level: IntakeLevel::Other,
          notes:        Some("soup".into()),
        })],
      },
    ],
  };
  let counts = s.replace(plan).await.unwrap();
  assert_eq!(counts.deleted, 0);
  assert_eq!(counts.inserted, 2);

  let log = s.day_log(ctx.resident_id, ctx.day).await.unwrap();
  assert_eq!(log.records.len(), 2);
  assert_eq!(log.records[0].meal, MealWindow::Breakfast);
  assert_eq!(log.records[0].row, ObservationRow::Vitals(VitalsReading {
    systolic:  118,
    diastolic: 80,
    pulse:     70,
  }));
  assert!(matches!(
    &log.records[1].row,
    ObservationRow::Food(f) if f.intake_level == IntakeLevel::Other && f.notes.as_deref() == Some("soup")
  ));
  assert_eq!(log.missing_meals(), vec![MealWindow::Breakfast, MealWindow::Dinner]);
}

#[tokio::test]
async fn day_log_is_scoped_to_resident_and_date() {
  let s = store().await;
  let engine = CommitEngine::new(s.clone(), s.clone());
  let ctx = context();
  let other_resident = LogContext { resident_id: Uuid::new_v4(), ..ctx };
  let other_day = LogContext { day: ctx.day.succ_opt().unwrap(), ..ctx };

  for c in [ctx, other_resident, other_day] {
    engine.commit_meal(&c, MealWindow::Dinner, &meal_fields()).await.unwrap();
  }

  let log = s.day_log(ctx.resident_id, ctx.day).await.unwrap();
  assert_eq!(log.records.len(), 4);
  assert!(log.records.iter().all(|r| r.resident_id == ctx.resident_id && r.date == ctx.day));
}

#[tokio::test]
async fn vitals_replace_by_day() {
  let s = store().await;
  let engine = CommitEngine::new(s.clone(), s.clone());
  let ctx = context();

  for systolic in [120, 135] {
    let mut draft = WizardDraft::new(ctx.day);
    draft.set(MealWindow::Breakfast, vitals(systolic)).unwrap();
    engine.commit(&ctx, &draft).await.unwrap();
  }

  let log = s.day_log(ctx.resident_id, ctx.day).await.unwrap();
  assert_eq!(log.count(Category::Vitals), 1);
  assert!(matches!(
    log.records[0].row,
    ObservationRow::Vitals(VitalsReading { systolic: 135, .. })
  ));
}

#[tokio::test]
async fn liquid_slots_replace_as_a_set() {
  let s = store().await;
  let engine = CommitEngine::new(s.clone(), s.clone());
  let ctx = context();

  let three = ObservationFields {
    liquid_slots: vec!["Juice".into(), "Water".into(), "Tea".into()],
    ..Default::default()
  };
  engine.commit_meal(&ctx, MealWindow::Lunch, &three).await.unwrap();

  let one = ObservationFields { liquid_intake: Some("No".into()), ..Default::default() };
  let summary = engine.commit_meal(&ctx, MealWindow::Lunch, &one).await.unwrap();
  assert_eq!(summary.rows_deleted, 3);

  let log = s.day_log(ctx.resident_id, ctx.day).await.unwrap();
  let lunch = log.at(MealWindow::Lunch, Category::Liquid);
  assert_eq!(lunch.len(), 1);
  assert_eq!(lunch[0].row, ObservationRow::Liquid { intake: "No".into() });
}

#[tokio::test]
async fn liquid_slots_skip_the_empty_one() {
  let s = store().await;
  let engine = CommitEngine::new(s.clone(), s.clone());
  let ctx = context();

  let fields = ObservationFields {
    liquid_slot_1: Some("Juice".into()),
    liquid_slot_2: Some("Water".into()),
    liquid_slot_3: Some("".into()),
    ..Default::default()
  };
  engine.commit_meal(&ctx, MealWindow::Breakfast, &fields).await.unwrap();

  let log = s.day_log(ctx.resident_id, ctx.day).await.unwrap();
  let intakes: Vec<_> = log
    .by_category(Category::Liquid)
    .map(|r| r.row.clone())
    .collect();
  assert_eq!(intakes, vec![
    ObservationRow::Liquid { intake: "slot 1: Juice".into() },
    ObservationRow::Liquid { intake: "slot 2: Water".into() },
  ]);
}

// ─── Wizard end to end ───────────────────────────────────────────────────────

#[tokio::test]
async fn full_day_walk_writes_thirteen_rows() {
  let s = store().await;
  let engine = CommitEngine::new(s.clone(), s.clone());
  let ctrl = StepController::new(&engine);
  let ctx = context();
  let mut draft = WizardDraft::new(ctx.day);

  let vitals_fields = ObservationFields {
    systolic: Some(120.into()),
    diastolic: Some(80.into()),
    pulse: Some(70.into()),
    ..Default::default()
  };
  let mut position = ctrl
    .handle(&ctx, &mut draft, Position::FIRST, StepAction::Next, &vitals_fields)
    .await
    .unwrap()
    .position;

  loop {
    let out = ctrl
      .handle(&ctx, &mut draft, position, StepAction::Next, &meal_fields())
      .await
      .unwrap();
    match out.effect {
      StepEffect::Advanced => position = out.position,
      StepEffect::Completed(_) => break,
      other => panic!("unexpected effect {other:?}"),
    }
  }

  let log = s.day_log(ctx.resident_id, ctx.day).await.unwrap();
  assert_eq!(log.count(Category::Vitals), 1);
  assert_eq!(log.count(Category::Food), 3);
  assert_eq!(log.count(Category::Liquid), 3);
  assert_eq!(log.count(Category::Bowel), 3);
  assert_eq!(log.count(Category::Urine), 3);
  assert!(log.missing_meals().is_empty());
  assert!(draft.is_empty());

  let audit = s.recent(5).await.unwrap();
  assert_eq!(audit.len(), 1);
  assert_eq!(audit[0].user_id, ctx.user_id);
}

#[tokio::test]
async fn oneshot_twice_does_not_double_rows() {
  let s = store().await;
  let engine = CommitEngine::new(s.clone(), s.clone());
  let ctx = context();
  let mut fields = meal_fields();
  fields.systolic = Some(121.into());
  fields.diastolic = Some(79.into());
  fields.pulse = Some(64.into());

  engine.commit_meal(&ctx, MealWindow::Breakfast, &fields).await.unwrap();
  engine.commit_meal(&ctx, MealWindow::Breakfast, &fields).await.unwrap();

  let log = s.day_log(ctx.resident_id, ctx.day).await.unwrap();
  for category in [
    Category::Vitals,
    Category::Food,
    Category::Liquid,
    Category::Bowel,
    Category::Urine,
  ] {
    assert_eq!(log.at(MealWindow::Breakfast, category).len(), 1, "{category}");
  }
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_insert_rolls_back_the_whole_commit() {
  let s = store().await;
  let engine = CommitEngine::new(s.clone(), s.clone());
  let ctrl = StepController::new(&engine);
  let ctx = context();

  // Existing rows that the failed commit would have replaced.
  let mut earlier = WizardDraft::new(ctx.day);
  earlier.set(MealWindow::Breakfast, vitals(110)).unwrap();
  engine.commit(&ctx, &earlier).await.unwrap();

  let mut draft = WizardDraft::new(ctx.day);
  draft.set(MealWindow::Breakfast, vitals(150)).unwrap();
  let bowel = schedule::index_of(Category::Bowel, MealWindow::Dinner).unwrap();
  ctrl
    .handle(&ctx, &mut draft, bowel, StepAction::Next, &meal_fields())
    .await
    .unwrap();
  fail_inserts(&s, "bowel_movements", "dinner").await;
  let err = ctrl
    .handle(&ctx, &mut draft, Position::LAST, StepAction::Submit, &meal_fields())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::CommitFailed(_)));
  // The draft keeps everything submitted, ready for a retry.
  assert!(matches!(
    draft.get(MealWindow::Breakfast, Category::Vitals),
    Some(Observation::Vitals(VitalsReading { systolic: 150, .. }))
  ));
  assert!(draft.get(MealWindow::Dinner, Category::Bowel).is_some());
  assert!(draft.get(MealWindow::Dinner, Category::Urine).is_some());

  let log = s.day_log(ctx.resident_id, ctx.day).await.unwrap();
  assert_eq!(log.records.len(), 1);
  assert!(matches!(
    log.records[0].row,
    ObservationRow::Vitals(VitalsReading { systolic: 110, .. })
  ));
  assert!(log.at(MealWindow::Dinner, Category::Bowel).is_empty());
  assert!(log.at(MealWindow::Dinner, Category::Urine).is_empty());
  // Only the first, successful commit was audited.
  assert_eq!(s.recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn later_keys_are_untouched_after_a_failure() {
  let s = store().await;
  let ctx = context();
  fail_inserts(&s, "urine_output", "lunch").await;

  let plan = ReplacePlan {
    resident_id:  ctx.resident_id,
    date:         ctx.day,
    replacements: vec![
      Replacement {
        meal:     MealWindow::Lunch,
        category: Category::Liquid,
        rows:     Observation::Liquid(LiquidIntake::Choice(LiquidChoice::Partial)).rows(),
      },
      Replacement {
        meal:     MealWindow::Lunch,
        category: Category::Urine,
        rows:     Observation::Urine(UrineOutput { output: UrineChoice::No }).rows(),
      },
    ],
  };
  assert!(s.replace(plan).await.is_err());
  assert!(s.day_log(ctx.resident_id, ctx.day).await.unwrap().records.is_empty());
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_recent_is_newest_first() {
  let s = store().await;
  let user_id = Uuid::new_v4();
  for action in ["first", "second", "third"] {
    s.append(NewAuditEntry { user_id, action: action.into() }).await.unwrap();
  }

  let recent = s.recent(2).await.unwrap();
  let actions: Vec<_> = recent.iter().map(|e| e.action.as_str()).collect();
  assert_eq!(actions, ["third", "second"]);
}
