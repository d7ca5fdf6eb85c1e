/// Users page (`/users`): station and filter selectors over a paginated
/// list of driver cards.
use super::{
    Document, EventKind, Filter, LoadGeneration, Page, PageEvent, Pagination, RenderOptions, Station,
    absorb, declare_chrome, driver_card, handle_chrome, refresh_station_menu,
};
use crate::api::StatsApi;
use crate::api::types::DriverRecord;

pub const ROUTE: &str = "/users";

pub const STATION_SELECT: &str = "stationSelect";
pub const FILTER_SELECT: &str = "filterSelect";
const USERS_SECTION: &str = "usuariosContainer";
const PAGE_INFO: &str = "pageInfo";

const BINDINGS: &[EventKind] = &[
    EventKind::StationChanged,
    EventKind::FilterChanged,
    EventKind::NextPage,
    EventKind::PrevPage,
    EventKind::ToggleFilters,
    EventKind::ToggleStations,
    EventKind::ToggleUserMenu,
];

pub struct UsersPage<'a, A: StatsApi + ?Sized> {
    api: &'a A,
    station: Station,
    filter: Filter,
    users: Pagination<DriverRecord>,
    doc: Document,
    generation: LoadGeneration,
}

impl<'a, A: StatsApi + ?Sized> UsersPage<'a, A> {
    pub fn new(api: &'a A, opts: RenderOptions, station: Station, filter: Filter) -> Self {
        let mut doc = Document::new("Usuarios");
        declare_chrome(&mut doc, ROUTE, &filter);
        doc.declare_text(STATION_SELECT, "Estación", station.as_str())
            .declare_text(FILTER_SELECT, "Periodo", filter.as_str())
            .declare_cards(USERS_SECTION, "Usuarios")
            .declare_text(PAGE_INFO, "Paginación", "Página 1 de 1");
        Self {
            api,
            station,
            filter,
            users: Pagination::new(opts.page_size),
            doc,
            generation: LoadGeneration::default(),
        }
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn list(&self) -> &Pagination<DriverRecord> {
        &self.users
    }

    fn show_page(&mut self) {
        let cards = self.users.current().iter().map(driver_card).collect();
        self.doc.set_cards(USERS_SECTION, cards);
        self.doc.set_text(PAGE_INFO, self.users.label());
    }
}

impl<A: StatsApi + ?Sized> Page for UsersPage<'_, A> {
    fn route(&self) -> &'static str {
        ROUTE
    }

    fn document(&self) -> &Document {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn load(&mut self) {
        let generation = self.generation.next();
        let result = self.api.users(self.station.as_str(), self.filter.as_str());
        if let Some(users) = absorb("users", result) {
            self.users.reset(users);
            self.show_page();
        }
        self.doc.stamp(generation);
    }

    fn bindings(&self) -> &'static [EventKind] {
        BINDINGS
    }

    fn pagination(&self) -> Option<(usize, usize)> {
        Some((self.users.page(), self.users.page_count()))
    }

    fn go_to_page(&mut self, page: usize) {
        self.users.go_to(page);
        self.show_page();
    }

    fn handle(&mut self, event: PageEvent) -> bool {
        if !BINDINGS.contains(&event.kind()) {
            return false;
        }
        if handle_chrome(&mut self.doc, &event) {
            return true;
        }
        match event {
            PageEvent::StationChanged(station) => {
                self.doc.set_text(STATION_SELECT, station.as_str());
                self.station = station;
                self.load();
            }
            PageEvent::FilterChanged(filter) => {
                self.doc.set_text(FILTER_SELECT, filter.as_str());
                self.filter = filter;
                refresh_station_menu(&mut self.doc, ROUTE, &self.filter);
                self.load();
            }
            PageEvent::NextPage => {
                if self.users.next() {
                    self.show_page();
                }
            }
            PageEvent::PrevPage => {
                if self.users.prev() {
                    self.show_page();
                }
            }
            _ => return false,
        }
        true
    }
}
