//! Console code sent to the server

use screeps_rl_core::{BodyPart, Role};

const FIND_OWNED_ROOM: &str =
    "const room=Object.values(Game.rooms).find(r=>r.controller&&r.controller.my);";

/// Wrap a body in an IIFE that evaluates to `0`, so the console echoes
/// nothing but a zero
pub fn js_iife(body: &str) -> String {
    format!("(function(){{{}}})();0", body)
}

/// Spawn a creep from the first idle spawn when the room has enough energy
pub fn spawn_command(role: Role, body: &[BodyPart], energy_threshold: u32) -> String {
    let parts: Vec<&str> = body.iter().map(|p| p.as_str()).collect();
    js_iife(&format!(
        "{FIND_OWNED_ROOM}\
         if(room){{\
         const sp=_.find(Game.spawns,s=>!s.spawning);\
         if(sp&&room.energyAvailable>={energy_threshold}){{\
         sp.spawnCreep([{parts}],'{prefix}_'+Game.time,{{memory:{{role:'{role}'}}}});\
         }}}}",
        parts = parts.join(","),
        prefix = role.name_prefix(),
        role = role.as_str(),
    ))
}

/// Store `[energy_ready, harvester_work, upgrader_work, level, progress/100]`
/// under `state_key` and the living creep count under `count_key`, computed
/// by the server on the tick that executes it
pub fn state_snapshot_command(state_key: &str, count_key: &str, energy_threshold: u32) -> String {
    let work_sum = |role: Role| {
        format!(
            "_.sum(_.filter(Game.creeps,c=>c.memory.role==='{}').map(c=>c.getActiveBodyparts(WORK)))",
            role.as_str()
        )
    };
    js_iife(&format!(
        "{FIND_OWNED_ROOM}\
         if(room){{\
         const e=room.energyAvailable>={energy_threshold}?1:0;\
         const h={h};\
         const u={u};\
         const cl=room.controller.level;\
         const cp=Math.floor(room.controller.progress/100);\
         Memory['{state_key}']=JSON.stringify([e,h,u,cl,cp]);\
         Memory['{count_key}']=Object.keys(Game.creeps).length;\
         }}",
        h = work_sum(Role::Harvester),
        u = work_sum(Role::Upgrader),
    ))
}
