use bevy::prelude::*;

use super::Dashboard;
use super::snapshot::{AnchorRow, DashboardSnapshot};
use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::camera::viewport_camera::ViewportCamera;
use crate::tools::selection::{Selection, SelectionChanged, focus_anchor};

const ROW_IDLE: Color = Color::srgba(0.0, 0.0, 0.0, 0.0);
const ROW_HOVERED: Color = Color::srgba(1.0, 1.0, 1.0, 0.08);
const ROW_ACTIVE: Color = Color::srgba(0.96, 0.77, 0.19, 0.25);

#[derive(Component)]
pub struct DashboardPanel;

/// Status line and event counter.
#[derive(Component)]
pub struct DashboardHeader;

/// Container holding one clickable row per anchor.
#[derive(Component)]
pub struct AnchorList;

/// A clickable anchor row.
#[derive(Component, Debug, Clone, Copy)]
pub struct AnchorRowButton {
    pub index: usize,
}

/// Selected anchor details below the list.
#[derive(Component)]
pub struct DashboardDetails;

#[derive(Component)]
pub struct FpsText;

pub fn spawn_dashboard_panel(mut commands: Commands) {
    commands
        .spawn((
            DashboardPanel,
            Name::new("DashboardPanel"),
            BackgroundColor(Color::srgba(0.10, 0.11, 0.13, 0.85)),
            Node {
                width: Val::Px(320.0),
                position_type: PositionType::Absolute,
                left: Val::Px(12.0),
                top: Val::Px(12.0),
                padding: UiRect::all(Val::Px(12.0)),
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(6.0),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((
                Name::new("Title"),
                Text::new("Event Map"),
                TextFont { font_size: 18.0, ..default() },
                TextColor(Color::srgb(1.0, 1.0, 1.0)),
            ));
            parent.spawn((
                DashboardHeader,
                Text::new("Loading…"),
                TextFont { font_size: 13.0, ..default() },
                TextColor(Color::srgb(0.85, 0.87, 0.90)),
            ));
            parent.spawn((
                AnchorList,
                Name::new("AnchorList"),
                Node {
                    display: Display::Flex,
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(2.0),
                    ..default()
                },
            ));
            parent.spawn((
                DashboardDetails,
                Text::new(""),
                TextFont { font_size: 13.0, ..default() },
                TextColor(Color::srgb(0.85, 0.87, 0.90)),
            ));
        });

    commands.spawn((
        Text::new("FPS: "),
        TextFont { font_size: 16.0, ..default() },
        TextColor(Color::srgb(1., 0., 0.)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        },
        FpsText,
    ));
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "—".to_string(), |v| v.to_string())
}

pub fn render_header(snapshot: &DashboardSnapshot) -> String {
    let mut out = format!(
        "Status: {}   Events: {}",
        snapshot.status.as_str(),
        snapshot.event_count
    );
    if snapshot.anchors.is_empty() {
        out.push_str("\nNo anchors");
    }
    out
}

pub fn render_row(row: &AnchorRow) -> String {
    format!(
        "{:<14} {:>5}  {:<16} {}",
        row.id,
        row.last_severity.map_or_else(|| "—".to_string(), |s| format!("{s:.2}")),
        fmt_opt(row.last_type_label.as_deref()),
        row.last_event_ago
            .as_deref()
            .map_or_else(|| "—".to_string(), |ago| format!("{ago} ago")),
    )
}

pub fn render_details(snapshot: &DashboardSnapshot) -> String {
    let Some(selected) = &snapshot.selected else {
        return String::new();
    };
    let [x, y, z] = selected.position;
    let mut out = format!(
        "Selected: {}\nPosition: {x:.2}, {y:.2}, {z:.2}\nDistance: {:.2} m\n",
        selected.id, selected.distance_to_camera
    );
    if selected.history.is_empty() {
        out.push_str("no events\n");
    }
    for event in &selected.history {
        out.push_str(&format!(
            "{:>7} ago  {:<16} {:.2}\n",
            event.ago, event.label, event.severity
        ));
    }
    out
}

/// Respawn the anchor rows whenever a registry is installed.
pub fn rebuild_anchor_rows(
    mut commands: Commands,
    registry: Res<AnchorRegistry>,
    lists: Query<Entity, With<AnchorList>>,
    rows: Query<Entity, With<AnchorRowButton>>,
) {
    if !registry.is_changed() {
        return;
    }
    for row in &rows {
        commands.entity(row).despawn();
    }
    let Ok(list) = lists.single() else {
        return;
    };
    commands.entity(list).with_children(|parent| {
        for anchor in registry.iter() {
            parent.spawn((
                Button,
                AnchorRowButton {
                    index: anchor.index,
                },
                Text::new(anchor.name.clone()),
                TextFont { font_size: 13.0, ..default() },
                TextColor(Color::srgb(0.85, 0.87, 0.90)),
                BackgroundColor(ROW_IDLE),
                Node {
                    padding: UiRect::axes(Val::Px(4.0), Val::Px(2.0)),
                    ..default()
                },
            ));
        }
    });
}

/// Clicking a row selects and frames its anchor.
pub fn select_anchor_row(
    rows: Query<(&Interaction, &AnchorRowButton), Changed<Interaction>>,
    registry: Res<AnchorRegistry>,
    mut selection: ResMut<Selection>,
    mut viewport: ResMut<ViewportCamera>,
    mut changed: EventWriter<SelectionChanged>,
) {
    for (interaction, row) in &rows {
        if *interaction != Interaction::Pressed {
            continue;
        }
        if let Some(event) = focus_anchor(row.index, &registry, &mut selection, &mut viewport) {
            changed.write(event);
        }
    }
}

pub fn update_dashboard_panel(
    dashboard: Res<Dashboard>,
    selection: Res<Selection>,
    mut header: Query<&mut Text, (With<DashboardHeader>, Without<DashboardDetails>, Without<AnchorRowButton>)>,
    mut details: Query<&mut Text, (With<DashboardDetails>, Without<DashboardHeader>, Without<AnchorRowButton>)>,
    mut rows: Query<(&AnchorRowButton, &Interaction, &mut Text, &mut BackgroundColor)>,
) {
    for (row, interaction, _, mut background) in &mut rows {
        let color = if selection.is_selected(row.index) {
            ROW_ACTIVE
        } else if *interaction == Interaction::Hovered {
            ROW_HOVERED
        } else {
            ROW_IDLE
        };
        background.set_if_neq(BackgroundColor(color));
    }

    if !dashboard.is_changed() {
        return;
    }
    let Some(snapshot) = &dashboard.snapshot else {
        return;
    };
    for mut text in &mut header {
        text.0 = render_header(snapshot);
    }
    for mut text in &mut details {
        text.0 = render_details(snapshot);
    }
    for (row, _, mut text, _) in &mut rows {
        if let Some(data) = snapshot.anchors.iter().find(|data| data.index == row.index) {
            text.0 = render_row(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::ingestion::ConnectionStatus;
    use crate::tools::dashboard::snapshot::SelectedDetails;
    use bevy::ecs::system::RunSystemOnce;

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            status: ConnectionStatus::Connected,
            event_count: 3,
            anchors: vec![AnchorRow {
                index: 0,
                id: "CCTV_1".into(),
                heat: 0.4,
                last_severity: Some(0.5),
                last_event_ago: Some("2s".into()),
                last_type: Some("fire".into()),
                last_type_label: Some("Fire".into()),
            }],
            selected: Some(SelectedDetails {
                index: 0,
                id: "CCTV_1".into(),
                position: [1.0, 2.0, 3.0],
                distance_to_camera: 10.0,
                history: Vec::new(),
            }),
        }
    }

    #[test]
    fn renders_rows_and_selection() {
        let snapshot = snapshot();
        assert_eq!(render_header(&snapshot), "Status: connected   Events: 3");
        let row = render_row(&snapshot.anchors[0]);
        assert!(row.starts_with("CCTV_1"));
        assert!(row.contains("0.50"));
        assert!(row.contains("2s ago"));
        let details = render_details(&snapshot);
        assert!(details.contains("Position: 1.00, 2.00, 3.00"));
        assert!(details.contains("no events"));
    }

    #[test]
    fn pressing_a_row_selects_and_frames_its_anchor() {
        let mut registry = AnchorRegistry::default();
        registry.register("CCTV_1", Vec3::ZERO);
        registry.register("CCTV_2", Vec3::new(30.0, 2.0, -8.0));

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<SelectionChanged>()
            .insert_resource(registry)
            .init_resource::<Selection>()
            .init_resource::<ViewportCamera>();
        app.world_mut().spawn((AnchorRowButton { index: 1 }, Interaction::Pressed));

        app.world_mut().run_system_once(select_anchor_row).unwrap();

        assert_eq!(app.world().resource::<Selection>().selected(), Some(1));
        assert_eq!(
            app.world().resource::<ViewportCamera>().focus_point,
            Vec3::new(30.0, 2.0, -8.0)
        );
        let events = app.world().resource::<Events<SelectionChanged>>();
        assert_eq!(events.len(), 1);
    }
}
