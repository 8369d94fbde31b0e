use std::{fs, time::Duration};

use chrono::Utc;
use client_core::{
    invitation_text, AdminScreen, Countdown, CountdownDuration, CountdownTicker, CsvStyle,
    EventDetails, GatewayOutcome, GatewayRequest, Notice, NoticeSeverity, RequestKind, ViewMode,
    ViewModel, GUEST_LIST_FILE_NAME, INVITATION_FILE_NAME,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::FamilySide;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::theme;

const REPAINT_INTERVAL: Duration = Duration::from_millis(250);

pub struct RsvpApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    view: ViewModel,
    ticker: CountdownTicker,
    event: EventDetails,
    csv_style: CsvStyle,
    focus_login_email: bool,
}

impl RsvpApp {
    /// Builds the app and asks the worker for any session it already holds.
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        event: EventDetails,
        csv_style: CsvStyle,
    ) -> Self {
        let ticker = CountdownTicker::new(event.target, Utc::now());
        let mut app = Self {
            cmd_tx,
            ui_rx,
            view: ViewModel::new(),
            ticker,
            event,
            csv_style,
            focus_login_email: true,
        };
        let request = app.view.start();
        app.dispatch(request);
        app
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    fn dispatch(&mut self, request: Option<GatewayRequest>) {
        let Some(request) = request else {
            return;
        };
        let kind = request.kind();
        if let Err(err) = dispatch_backend_command(&self.cmd_tx, BackendCommand::Gateway(request))
        {
            self.view.abandon(kind, err.user_message());
        }
    }

    pub fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Outcome(outcome) => self.handle_outcome(outcome),
                UiEvent::SessionChanged(session) => self.view.apply_session_change(session),
                UiEvent::Error(err) => {
                    tracing::warn!(
                        context = ?err.context(),
                        category = ?err.category(),
                        "{}",
                        err.message()
                    );
                    self.view.notify(Notice::error(err.user_message()));
                }
            }
        }
    }

    /// Folds a worker outcome into the view. A guest fetch the backend
    /// refused for auth reasons ends the admin session so the login form
    /// comes back.
    fn handle_outcome(&mut self, outcome: GatewayOutcome) {
        let reauth = match &outcome {
            GatewayOutcome::Fetched(Err(reason)) => {
                UiError::from_message(UiErrorContext::Fetch, reason.as_str()).requires_reauth()
            }
            _ => false,
        };
        self.view.apply_outcome(humanize_outcome(outcome));
        if reauth && self.view.is_authenticated() {
            tracing::warn!("guest fetch rejected; signing out to re-prompt login");
            let request = self.view.sign_out();
            self.dispatch(request);
        }
    }

    fn save_with_dialog(&mut self, file_name: &str, contents: &str, what: &str) {
        let Some(path) = rfd::FileDialog::new().set_file_name(file_name).save_file() else {
            return;
        };
        match fs::write(&path, contents) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "{what} saved");
                self.view
                    .notify(Notice::success(format!("Saved {what} to {}", path.display())));
            }
            Err(err) => {
                let err = UiError::from_message(
                    UiErrorContext::Export,
                    format!("could not write {}: {err}", path.display()),
                );
                self.view.notify(Notice::error(err.user_message()));
            }
        }
    }

    fn show_navigation(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            for mode in ViewMode::ALL {
                let selected = self.view.mode() == mode;
                let mut text = egui::RichText::new(mode.label()).strong();
                if selected {
                    text = text.color(egui::Color32::WHITE);
                }
                let mut button = egui::Button::new(text).selected(selected);
                if selected {
                    button = button.fill(theme::ACCENT);
                }
                if ui.add(button).clicked() {
                    self.view.navigate(mode);
                    if mode == ViewMode::Admin {
                        self.focus_login_email = true;
                    }
                }
            }
        });
    }

    fn show_notice(&mut self, ui: &mut egui::Ui) {
        let Some(notice) = self.view.notice().cloned() else {
            return;
        };
        let (fill, stroke) = match notice.severity {
            NoticeSeverity::Error => (
                egui::Color32::from_rgb(111, 53, 53),
                egui::Color32::from_rgb(175, 96, 96),
            ),
            NoticeSeverity::Success => (
                egui::Color32::from_rgb(46, 96, 60),
                egui::Color32::from_rgb(96, 160, 110),
            ),
            NoticeSeverity::Info => (theme::HEADING, theme::ACCENT_SOFT),
        };

        egui::Frame::NONE
            .fill(fill)
            .stroke(egui::Stroke::new(1.0, stroke))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&notice.message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.view.dismiss_notice();
                        }
                    });
                });
            });
        ui.add_space(8.0);
    }

    fn card<R>(ui: &mut egui::Ui, fill: egui::Color32, add: impl FnOnce(&mut egui::Ui) -> R) -> R {
        egui::Frame::NONE
            .fill(fill)
            .corner_radius(16.0)
            .stroke(egui::Stroke::new(1.0, theme::lighten_color(theme::ACCENT_SOFT, 0.6)))
            .inner_margin(egui::Margin::symmetric(20, 18))
            .show(ui, add)
            .inner
    }

    fn show_home(&mut self, ui: &mut egui::Ui) {
        let countdown = self.ticker.current();
        ui.vertical_centered(|ui| {
            ui.set_max_width(520.0);
            Self::card(ui, theme::CARD, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(self.event.couple.replace('&', "💜"))
                            .size(30.0)
                            .strong()
                            .color(theme::HEADING),
                    );
                    ui.label(&self.event.date_label);
                    ui.add_space(12.0);
                    match countdown {
                        Countdown::Remaining(left) => {
                            egui::Grid::new("countdown_grid")
                                .num_columns(2)
                                .spacing([48.0, 10.0])
                                .show(ui, |ui| {
                                    for (row, (value, unit)) in
                                        countdown_cells(left).into_iter().enumerate()
                                    {
                                        ui.label(
                                            egui::RichText::new(format!("{value} {unit}"))
                                                .strong()
                                                .size(18.0)
                                                .color(theme::ACCENT_SOFT),
                                        );
                                        if row % 2 == 1 {
                                            ui.end_row();
                                        }
                                    }
                                });
                        }
                        Countdown::Expired => {
                            ui.label(
                                egui::RichText::new("The celebration has begun 💜")
                                    .strong()
                                    .size(18.0)
                                    .color(theme::ACCENT_SOFT),
                            );
                        }
                    }
                });
            });
        });
    }

    fn show_register(&mut self, ui: &mut egui::Ui) {
        ui.columns(FamilySide::ALL.len(), |columns| {
            for (column, side) in columns.iter_mut().zip(FamilySide::ALL) {
                self.show_rsvp_card(column, side);
            }
        });
    }

    fn show_rsvp_card(&mut self, ui: &mut egui::Ui, side: FamilySide) {
        let submitting = self.view.is_pending(RequestKind::Submit);
        let clicked = Self::card(ui, theme::CARD, |ui| {
            ui.style_mut().spacing.item_spacing = egui::vec2(8.0, 10.0);
            ui.label(
                egui::RichText::new(format!("{} Family RSVP", side.label()))
                    .size(20.0)
                    .strong()
                    .color(theme::HEADING),
            );
            let draft = self.view.draft_mut();
            for (field, hint, value) in [
                ("name", "Full Name", &mut draft.name),
                ("email", "Email", &mut draft.email),
                ("phone", "Phone", &mut draft.phone),
            ] {
                ui.add(
                    egui::TextEdit::singleline(value)
                        .id_salt((side.as_str(), field))
                        .hint_text(hint)
                        .desired_width(f32::INFINITY),
                );
            }
            let button = egui::Button::new(
                egui::RichText::new("Submit RSVP")
                    .strong()
                    .color(egui::Color32::WHITE),
            )
            .fill(theme::ACCENT_SOFT)
            .min_size(egui::vec2(ui.available_width(), 36.0));
            ui.add_enabled(!submitting, button).clicked()
        });

        if clicked {
            let request = self.view.submit_rsvp(side);
            self.dispatch(request);
        }
    }

    fn show_invitation(&mut self, ui: &mut egui::Ui) {
        let mut save_clicked = false;
        ui.vertical_centered(|ui| {
            ui.set_max_width(440.0);
            Self::card(ui, theme::CARD_TINT, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("Wedding Invitation")
                            .size(26.0)
                            .strong()
                            .color(theme::HEADING),
                    );
                    ui.add_space(6.0);
                    ui.label(
                        egui::RichText::new(&self.event.couple)
                            .size(20.0)
                            .strong(),
                    );
                    ui.label("Request the pleasure of your presence");
                    ui.add_space(12.0);
                    ui.label(egui::RichText::new(&self.event.date_label).strong());
                    ui.label(&self.event.theme_line);
                    ui.add_space(18.0);
                    let button = egui::Button::new(
                        egui::RichText::new("Save invitation").color(egui::Color32::WHITE),
                    )
                    .fill(theme::HEADING);
                    save_clicked = ui.add(button).clicked();
                });
            });
        });

        if save_clicked {
            let text = invitation_text(&self.event);
            self.save_with_dialog(INVITATION_FILE_NAME, &text, "invitation");
        }
    }

    fn show_admin(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.set_max_width(760.0);
            match self.view.admin_screen() {
                AdminScreen::Login => self.show_login(ui),
                AdminScreen::Dashboard => self.show_dashboard(ui),
            }
        });
    }

    fn show_login(&mut self, ui: &mut egui::Ui) {
        let signing_in = self.view.is_pending(RequestKind::SignIn);
        let focus_email = std::mem::take(&mut self.focus_login_email);
        let submit = Self::card(ui, theme::CARD, |ui| {
            ui.style_mut().spacing.item_spacing = egui::vec2(10.0, 10.0);
            ui.label(
                egui::RichText::new("Secure Admin Login")
                    .size(20.0)
                    .strong()
                    .color(theme::HEADING),
            );
            let credentials = self.view.credentials_mut();
            let email = ui.add_sized(
                [ui.available_width(), 34.0],
                egui::TextEdit::singleline(&mut credentials.email)
                    .id_salt("admin_email")
                    .hint_text("Admin Email"),
            );
            if focus_email {
                email.request_focus();
            }
            let password = ui.add_sized(
                [ui.available_width(), 34.0],
                egui::TextEdit::singleline(&mut credentials.password)
                    .id_salt("admin_password")
                    .hint_text("Password")
                    .password(true),
            );

            let enter_pressed = ui.input(|i| i.key_pressed(egui::Key::Enter));
            let enter_submits = enter_pressed && (email.lost_focus() || password.lost_focus());

            let button = egui::Button::new(
                egui::RichText::new("Login")
                    .strong()
                    .size(16.0)
                    .color(egui::Color32::WHITE),
            )
            .fill(theme::HEADING)
            .min_size(egui::vec2(ui.available_width(), 40.0));
            let clicked = ui.add_enabled(!signing_in, button).clicked();
            if signing_in {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Signing in...");
                });
            }
            (clicked || enter_submits) && !signing_in
        });

        if submit {
            let request = self.view.sign_in();
            self.dispatch(request);
        }
    }

    fn show_dashboard(&mut self, ui: &mut egui::Ui) {
        let loading = self.view.is_pending(RequestKind::FetchAll);
        let signing_out = self.view.is_pending(RequestKind::SignOut);
        let mut load_clicked = false;
        let mut export_clicked = false;
        let mut logout_clicked = false;

        Self::card(ui, theme::CARD, |ui| {
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label(
                        egui::RichText::new("Admin Dashboard")
                            .size(20.0)
                            .strong()
                            .color(theme::HEADING),
                    );
                    if let Some(session) = self.view.session() {
                        ui.weak(format!("Signed in as {}", session.display_email()));
                    }
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let button = egui::Button::new(
                        egui::RichText::new("Logout").color(egui::Color32::WHITE),
                    )
                    .fill(theme::DANGER);
                    logout_clicked = ui.add_enabled(!signing_out, button).clicked();
                });
            });
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                let button = egui::Button::new(
                    egui::RichText::new("Load Guests").color(egui::Color32::WHITE),
                )
                .fill(theme::ACCENT_SOFT);
                load_clicked = ui.add_enabled(!loading, button).clicked();
                if loading {
                    ui.spinner();
                }
                let button = egui::Button::new(
                    egui::RichText::new("Export CSV").color(egui::Color32::WHITE),
                )
                .fill(theme::EXPORT);
                export_clicked = ui.add(button).clicked();
            });
            ui.add_space(8.0);

            let stats = self.view.stats();
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!("Bride Guests: {}", stats.bride))
                        .strong()
                        .color(theme::ACCENT_SOFT),
                );
                ui.add_space(24.0);
                ui.label(
                    egui::RichText::new(format!("Groom Guests: {}", stats.groom))
                        .strong()
                        .color(theme::ACCENT_SOFT),
                );
            });
            ui.add_space(8.0);

            egui::Grid::new("guest_table")
                .num_columns(4)
                .striped(true)
                .min_col_width(120.0)
                .show(ui, |ui| {
                    for header in ["Name", "Email", "Phone", "Side"] {
                        ui.label(egui::RichText::new(header).strong());
                    }
                    ui.end_row();
                    for guest in self.view.guests() {
                        ui.label(&guest.name);
                        ui.label(&guest.email);
                        ui.label(&guest.phone);
                        ui.label(guest.side_label());
                        ui.end_row();
                    }
                });
        });

        if load_clicked {
            let request = self.view.refresh_guests();
            self.dispatch(request);
        }
        if export_clicked {
            let csv = self.view.export_csv(self.csv_style);
            self.save_with_dialog(GUEST_LIST_FILE_NAME, &csv, "guest list");
        }
        if logout_clicked {
            let request = self.view.sign_out();
            self.dispatch(request);
        }
    }
}

/// Sign-in failures get actionable wording; other outcomes pass through.
fn humanize_outcome(outcome: GatewayOutcome) -> GatewayOutcome {
    match outcome {
        GatewayOutcome::SignedIn(Err(reason)) => GatewayOutcome::SignedIn(Err(
            UiError::from_message(UiErrorContext::SignIn, reason).user_message(),
        )),
        other => other,
    }
}

fn countdown_cells(left: CountdownDuration) -> [(u64, &'static str); 4] {
    [
        (left.days, "Days"),
        (left.hours, "Hours"),
        (left.minutes, "Minutes"),
        (left.seconds, "Seconds"),
    ]
}

impl eframe::App for RsvpApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.ticker.poll(Utc::now());

        egui::TopBottomPanel::top("navigation")
            .frame(
                egui::Frame::NONE
                    .fill(theme::lighten_color(theme::BACKGROUND, 0.4))
                    .inner_margin(egui::Margin::symmetric(12, 8)),
            )
            .show(ctx, |ui| self.show_navigation(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(12.0);
                self.show_notice(ui);
                match self.view.mode() {
                    ViewMode::Home => self.show_home(ui),
                    ViewMode::Register => self.show_register(ui),
                    ViewMode::Invitation => self.show_invitation(ui),
                    ViewMode::Admin => self.show_admin(ui),
                }
            });
        });

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

impl Drop for RsvpApp {
    fn drop(&mut self) {
        if let Err(err) = dispatch_backend_command(&self.cmd_tx, BackendCommand::Shutdown) {
            tracing::debug!("backend already gone at shutdown: {}", err.message());
        }
    }
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
