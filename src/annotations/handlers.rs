//! Drawing message handlers
//!
//! Handles DrawMsg for tool selection, point collection, naming and the zone list.

use crate::domain::DisplayPointer;
use crate::session::messages::{DrawMsg, Feedback};
use crate::session::state::Session;

use super::drawing::{DiscardReason, NameOutcome, PointOutcome};

/// Handle a DrawMsg, modifying the session
pub fn handle_draw_msg(session: &mut Session, msg: DrawMsg) -> Vec<Feedback> {
    match msg {
        DrawMsg::SelectTool(tool) => {
            session.drawing.select_tool(tool);
            vec![Feedback::info(format!(
                "Herramienta: {} ({} puntos)",
                tool.label(),
                tool.required_points()
            ))]
        }
        DrawMsg::ToggleClass(class) => {
            let on = session.selected.toggle(class);
            vec![Feedback::info(format!(
                "{} {}",
                class,
                if on { "activado" } else { "desactivado" }
            ))]
        }
        DrawMsg::Click(pointer) => handle_click(session, pointer),
        DrawMsg::Name(name) => {
            let name = name.unwrap_or_else(|| session.zones.suggested_name());
            submit(session, Some(&name))
        }
        DrawMsg::CancelName => submit(session, None),
        DrawMsg::Undo => match session.zones.undo_last() {
            Some(zone) => vec![Feedback::info(format!("Zona '{}' eliminada", zone.name))],
            None => vec![Feedback::info("No hay zonas para deshacer")],
        },
        DrawMsg::Clear => {
            session.clear_zones();
            vec![Feedback::info("Todas las zonas eliminadas")]
        }
    }
}

fn naming_prompt(session: &Session) -> Feedback {
    Feedback::Prompt(format!(
        "Nombre de la zona (sugerido: {}): name [texto] | cancel",
        session.zones.suggested_name()
    ))
}

fn discarded(reason: DiscardReason) -> Feedback {
    match reason {
        DiscardReason::NoClasses => {
            Feedback::warning("Seleccione al menos una clase; forma descartada")
        }
    }
}

fn handle_click(session: &mut Session, pointer: DisplayPointer) -> Vec<Feedback> {
    let Some(point) = pointer.to_media(session.dims(), session.fit) else {
        return vec![Feedback::warning("Clic fuera de la imagen")];
    };

    let frozen = session.is_running();
    match session.drawing.add_point(point, frozen, &session.selected) {
        PointOutcome::Ignored if frozen => {
            vec![Feedback::warning("Análisis en curso: dibujo bloqueado")]
        }
        PointOutcome::Ignored => vec![naming_prompt(session)],
        PointOutcome::Collecting { have, need } => vec![Feedback::info(format!(
            "Punto {}/{} en ({:.1}, {:.1})",
            have, need, point.x, point.y
        ))],
        PointOutcome::NameRequested => vec![naming_prompt(session)],
        PointOutcome::Discarded(reason) => vec![discarded(reason)],
    }
}

fn submit(session: &mut Session, name: Option<&str>) -> Vec<Feedback> {
    let outcome = session
        .drawing
        .submit_name(name, &session.selected, &mut session.zones);
    match outcome {
        NameOutcome::Committed(index) => {
            let zone = &session.zones.as_slice()[index];
            vec![Feedback::info(format!(
                "Zona #{} '{}' ({}) creada",
                index + 1,
                zone.name,
                zone.kind.label()
            ))]
        }
        NameOutcome::Declined => vec![Feedback::info("Zona descartada")],
        NameOutcome::Discarded(reason) => vec![discarded(reason)],
        NameOutcome::NotAwaiting => vec![Feedback::warning("No hay zona pendiente de nombre")],
    }
}
