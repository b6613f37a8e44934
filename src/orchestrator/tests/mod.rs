// Tests for the orchestrator: phase flow, champion select, shutdown and reconnect



#[cfg(test)]
mod test_champ_select;
