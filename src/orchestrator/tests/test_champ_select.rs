// Tests for champion select ban/pick submission

use super::test_helpers::*;

#[cfg(test)]
mod champ_select_tests {
    use super::*;
    use crate::lcu::{champ_select_action_path, EventHandler, EventKind, LcuEvent, LCU_ALL_GRID_CHAMPIONS, LCU_CHAMP_SELECT_SESSION};
    use crate::orchestrator::{ChampSelectHandler, BRAVERY_CHAMPION_ID};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn grid() -> Value {
        json!([
            {"id": 103, "owned": true, "freeToPlay": false, "selectionStatus": {"pickedByOtherOrBanned": true}},
            {"id": 222, "owned": true, "freeToPlay": false, "selectionStatus": {"pickedByOtherOrBanned": false}},
            {"id": 1, "owned": false, "freeToPlay": false, "selectionStatus": {"pickedByOtherOrBanned": false}}
        ])
    }

    fn session_event(timer_phase: &str, actions: Value) -> LcuEvent {
        LcuEvent {
            uri: LCU_CHAMP_SELECT_SESSION.to_string(),
            kind: EventKind::Update,
            data: json!({
                "localPlayerCellId": 4,
                "timer": {"phase": timer_phase},
                "actions": actions
            }),
        }
    }

    fn patch(action_id: i64, champion: i64) -> String {
        format!("PATCH {} championId={}", champ_select_action_path(action_id), champion)
    }

    /// Test: preferred champion already taken
    ///
    /// Scenario: local pick in progress, preferred id 103 is rejected by the client.
    /// Expected: bravery (-3) submitted right after the preferred id, and the handler
    /// stops there because it was accepted.
    #[tokio::test]
    async fn test_rejected_preferred_falls_back_to_bravery() {
        let h = harness();
        h.lcu.respond(LCU_ALL_GRID_CHAMPIONS, grid());
        h.lcu.reject_champion(103);
        let handler = Arc::new(ChampSelectHandler::new(h.orch.clone()));

        let event = session_event(
            "BAN_PICK",
            json!([[{"id": 9, "actorCellId": 4, "type": "pick", "isInProgress": true, "completed": false}]]),
        );
        handler.prepare(&event).unwrap().await.unwrap();

        assert_eq!(
            h.journal.entries(),
            vec![
                format!("GET {}", LCU_ALL_GRID_CHAMPIONS),
                patch(9, 103),
                patch(9, BRAVERY_CHAMPION_ID),
            ]
        );
    }

    /// Test: every candidate rejected
    ///
    /// Expected: preferred, bravery, then a random owned-or-free champion are tried in order.
    #[tokio::test]
    async fn test_random_pick_is_last_resort() {
        let h = harness();
        h.lcu.respond(LCU_ALL_GRID_CHAMPIONS, grid());
        h.lcu.reject_champion(103);
        h.lcu.reject_champion(BRAVERY_CHAMPION_ID);
        let handler = Arc::new(ChampSelectHandler::new(h.orch.clone()));

        let event = session_event(
            "BAN_PICK",
            json!([[{"id": 9, "actorCellId": 4, "type": "pick", "isInProgress": true, "completed": false}]]),
        );
        handler.prepare(&event).unwrap().await.unwrap();

        let entries = h.journal.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1], patch(9, 103));
        assert_eq!(entries[2], patch(9, BRAVERY_CHAMPION_ID));
        assert!(entries[3] == patch(9, 103) || entries[3] == patch(9, 222));
    }

    /// Test: ban action for the local player
    ///
    /// Expected: one ban from the owned-or-free pool that excludes taken champions.
    #[tokio::test]
    async fn test_ban_picks_from_available_pool() {
        let h = harness();
        h.lcu.respond(LCU_ALL_GRID_CHAMPIONS, grid());
        let handler = Arc::new(ChampSelectHandler::new(h.orch.clone()));

        let event = session_event(
            "BAN_PICK",
            json!([
                [{"id": 3, "actorCellId": 4, "type": "ban", "isInProgress": true, "completed": false}],
                [{"id": 4, "actorCellId": 4, "type": "ban", "isInProgress": true, "completed": false}]
            ]),
        );
        handler.prepare(&event).unwrap().await.unwrap();

        assert_eq!(
            h.journal.entries(),
            vec![format!("GET {}", LCU_ALL_GRID_CHAMPIONS), patch(3, 222)]
        );
    }

    /// Test: snapshots that are not actionable
    ///
    /// Expected: outside BAN_PICK, or with only other players' actions, nothing is scheduled.
    #[tokio::test]
    async fn test_ignores_non_actionable_snapshots() {
        let h = harness();
        let handler = Arc::new(ChampSelectHandler::new(h.orch.clone()));

        let planning = session_event(
            "PLANNING",
            json!([[{"id": 9, "actorCellId": 4, "type": "pick", "isInProgress": true, "completed": false}]]),
        );
        assert!(handler.clone().prepare(&planning).is_none());

        let others = session_event(
            "BAN_PICK",
            json!([[{"id": 9, "actorCellId": 5, "type": "pick", "isInProgress": true, "completed": false}]]),
        );
        assert!(handler.clone().prepare(&others).is_none());

        let junk = LcuEvent {
            uri: LCU_CHAMP_SELECT_SESSION.to_string(),
            kind: EventKind::Update,
            data: json!("not a session"),
        };
        assert!(handler.prepare(&junk).is_none());
        assert!(h.journal.entries().is_empty());
    }

    /// Test: champion grid unavailable
    ///
    /// Expected: the pick is abandoned for this snapshot without submitting anything.
    #[tokio::test]
    async fn test_grid_failure_abandons_pick() {
        let h = harness();
        let handler = Arc::new(ChampSelectHandler::new(h.orch.clone()));
        let event = session_event(
            "BAN_PICK",
            json!([[{"id": 9, "actorCellId": 4, "type": "pick", "isInProgress": true, "completed": false}]]),
        );
        handler.prepare(&event).unwrap().await.unwrap();
        assert_eq!(h.journal.entries(), vec![format!("GET {}", LCU_ALL_GRID_CHAMPIONS)]);
    }
}
