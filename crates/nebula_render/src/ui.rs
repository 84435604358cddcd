use bevy::prelude::*;
use nebula_core::{ControlField, ParticleControls};
use nebula_sim::Surface;

/// Marker for the control panel text
#[derive(Component)]
pub struct ControlPanel;

/// Field currently selected in the control panel
#[derive(Resource, Default)]
pub struct PanelCursor {
    pub selected: usize,
}

/// HUD frame counter for throttling
#[derive(Resource, Default)]
pub struct HudThrottle {
    pub frame: u32,
}

/// Spawn the control panel overlay (top-left, hidden until we are the host)
pub fn spawn_control_panel(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 15.0,
            ..default()
        },
        TextColor(Color::srgba(0.85, 0.9, 1.0, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        Visibility::Hidden,
        ControlPanel,
    ));
}

/// Format one control value the way the panel shows it
fn fmt_value(field: ControlField, controls: &ParticleControls) -> String {
    let value = controls.get(field);
    match field {
        ControlField::Count | ControlField::CenterPoints => format!("{value:.0}"),
        ControlField::Attraction => format!("{value:.3}"),
        ControlField::ResetRadius | ControlField::CenterRadius => format!("{value:.0}"),
        _ => format!("{value:.1}"),
    }
}

/// Panel contents. Collapsed panels show only the expand hint.
pub fn panel_text(controls: &ParticleControls, selected: usize, collapsed: bool) -> String {
    if collapsed {
        return "[H] Particle controls".to_string();
    }

    let mut lines = vec!["Particle controls".to_string(), String::new()];
    for (i, field) in ControlField::ALL.iter().enumerate() {
        let marker = if i == selected { ">" } else { " " };
        lines.push(format!(
            "{marker} {:<14} {}",
            field.label(),
            fmt_value(*field, controls)
        ));
    }
    lines.push(String::new());
    lines.push("[Up/Down] Select  [Left/Right] Adjust  [Shift] x10".to_string());
    lines.push("[R] Rebuild particles  [H] Hide".to_string());
    lines.join("\n")
}

/// Refresh the panel every 10th frame; only the leftmost window shows it
pub fn update_control_panel(
    surface: Res<Surface>,
    cursor: Res<PanelCursor>,
    mut throttle: ResMut<HudThrottle>,
    mut panel_q: Query<(&mut Text, &mut Visibility), With<ControlPanel>>,
) {
    throttle.frame = throttle.frame.wrapping_add(1);
    if throttle.frame % 10 != 0 && !cursor.is_changed() {
        return;
    }
    let Ok((mut text, mut visibility)) = panel_q.get_single_mut() else {
        return;
    };

    if !surface.is_control_host() {
        *visibility = Visibility::Hidden;
        return;
    }
    *visibility = Visibility::Visible;
    **text = panel_text(
        &surface.controls(),
        cursor.selected,
        surface.panel_collapsed(),
    );
}

/// Keyboard editing of the shared controls. Ignored on non-host windows.
pub fn control_input_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut cursor: ResMut<PanelCursor>,
    mut surface: ResMut<Surface>,
) {
    if !surface.is_control_host() {
        return;
    }

    if keyboard.just_pressed(KeyCode::KeyH) {
        if let Err(e) = surface.toggle_panel() {
            warn!("Failed to publish panel state: {e}");
        }
    }
    if surface.panel_collapsed() {
        return;
    }

    let fields = ControlField::ALL.len();
    if keyboard.just_pressed(KeyCode::ArrowDown) {
        cursor.selected = (cursor.selected + 1) % fields;
    }
    if keyboard.just_pressed(KeyCode::ArrowUp) {
        cursor.selected = (cursor.selected + fields - 1) % fields;
    }

    let boost = if keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight) {
        10
    } else {
        1
    };
    let mut steps = 0;
    if keyboard.just_pressed(KeyCode::ArrowRight) {
        steps += boost;
    }
    if keyboard.just_pressed(KeyCode::ArrowLeft) {
        steps -= boost;
    }
    if steps != 0 {
        let field = ControlField::ALL[cursor.selected % fields];
        match surface.nudge(field, steps) {
            Ok(()) => info!("{} = {}", field.label(), fmt_value(field, &surface.controls())),
            Err(e) => warn!("Control edit rejected: {e}"),
        }
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        match surface.request_rebuild() {
            Ok(()) => info!("Particles rebuilt on every window"),
            Err(e) => warn!("Rebuild applied locally but not broadcast: {e}"),
        }
    }
}
