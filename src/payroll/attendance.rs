use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    entity::{
        employee, leave_request, prelude::*,
        sea_orm_active_enums::{LeaveStatus, LeaveType},
        time_log,
    },
    payroll::PayrollPolicy,
    utils,
};

/// Month-level attendance totals for one employee.
///
/// `payable_days` can exceed `total_working_days` when an employee also works
/// weekends; proration handles that without special-casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthPayableSummary {
    pub employee_id: Uuid,
    pub total_working_days: u32,
    pub present_days: u32,
    pub paid_leave_days: u32,
    pub unpaid_leave_days: u32,
    pub payable_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub work_seconds: i64,
    pub leave: Option<LeaveType>,
    pub present: bool,
}

#[derive(Debug, Serialize)]
pub struct AttendanceMe {
    pub days: Vec<DayRecord>,
    pub kpi: AttendanceKpi,
}

#[derive(Debug, Serialize)]
pub struct AttendanceKpi {
    pub total_working_days: u32,
    pub present_days: u32,
    pub paid_leave_days: u32,
    pub unpaid_leave_days: u32,
    pub payable_days: u32,
    pub total_work_hours: f64,
}

/// Working days are a policy constant for the month, not an observed value.
pub fn total_working_days(first: NaiveDate, policy: &PayrollPolicy) -> u32 {
    let last = utils::last_of_month(first);

    if policy.business_days_only {
        utils::count_working_days(first, last)
    } else {
        utils::count_calendar_days(first, last)
    }
}

/// A day under any leave type is never simultaneously counted present.
fn is_present(work_seconds: i64, leave: Option<LeaveType>, policy: &PayrollPolicy) -> bool {
    leave.is_none() && work_seconds as f64 / 3600.0 >= policy.min_active_hours
}

/// Per-day worked seconds, keyed by employee. Only intervals with both ends
/// set count; an interval is attributed to the day it started on.
fn work_seconds_map(logs: &[time_log::Model]) -> HashMap<Uuid, HashMap<NaiveDate, i64>> {
    let mut map: HashMap<Uuid, HashMap<NaiveDate, i64>> = HashMap::new();

    for log in logs {
        let Some(ended_at) = log.ended_at else { continue };

        let seconds = (ended_at - log.started_at).num_seconds().max(0);
        *map.entry(log.employee_id)
            .or_default()
            .entry(log.started_at.date_naive())
            .or_insert(0) += seconds;
    }

    map
}

/// Per-day leave type, keyed by employee. `requests` must be ordered by
/// `created_at` ascending: when approved requests overlap on a date, the
/// earliest-created one wins, deterministically.
fn leave_map(
    requests: &[leave_request::Model],
    first: NaiveDate,
    last: NaiveDate,
) -> HashMap<Uuid, HashMap<NaiveDate, LeaveType>> {
    let mut map: HashMap<Uuid, HashMap<NaiveDate, LeaveType>> = HashMap::new();

    for request in requests {
        let days = map.entry(request.employee_id).or_default();

        let mut day = request.start_date.max(first);
        let until = request.end_date.min(last);

        while day <= until {
            days.entry(day).or_insert(request.leave_type);
            day = day.succ_opt().unwrap();
        }
    }

    map
}

fn build_day_records(
    first: NaiveDate,
    work_seconds: &HashMap<NaiveDate, i64>,
    leave: &HashMap<NaiveDate, LeaveType>,
    policy: &PayrollPolicy,
) -> Vec<DayRecord> {
    utils::days_of_month(first)
        .map(|date| {
            let work_seconds = work_seconds.get(&date).copied().unwrap_or(0);
            let leave = leave.get(&date).copied();

            DayRecord {
                date,
                work_seconds,
                leave,
                present: is_present(work_seconds, leave, policy),
            }
        })
        .collect()
}

fn summarize(employee_id: Uuid, days: &[DayRecord], total_working_days: u32) -> MonthPayableSummary {
    let present_days = days.iter().filter(|d| d.present).count() as u32;
    let paid_leave_days = days.iter().filter(|d| d.leave.is_some_and(|l| l.is_paid())).count() as u32;
    let unpaid_leave_days = days.iter().filter(|d| d.leave == Some(LeaveType::Unpaid)).count() as u32;

    MonthPayableSummary {
        employee_id,
        total_working_days,
        present_days,
        paid_leave_days,
        unpaid_leave_days,
        payable_days: present_days + paid_leave_days,
    }
}

/// Summaries for the given employees, keyed by employee id.
///
/// Employees without a single attendance fact in the month (no completed
/// time log, no approved leave day) get no entry; the orchestrator turns
/// that into a warning rather than a zero-value payslip.
pub async fn summaries_for_employees<C: ConnectionTrait>(
    db: &C,
    employee_ids: Vec<Uuid>,
    first: NaiveDate,
    policy: &PayrollPolicy,
) -> Result<HashMap<Uuid, MonthPayableSummary>, DbErr> {
    let last = utils::last_of_month(first);
    let (month_start, month_end) = utils::month_datetime_range(first);

    let logs = TimeLog::find()
        .filter(time_log::Column::EmployeeId.is_in(employee_ids.clone()))
        .filter(time_log::Column::StartedAt.gte(month_start))
        .filter(time_log::Column::StartedAt.lt(month_end))
        .filter(time_log::Column::EndedAt.is_not_null())
        .all(db)
        .await?;

    let leaves = LeaveRequest::find()
        .filter(leave_request::Column::EmployeeId.is_in(employee_ids.clone()))
        .filter(leave_request::Column::Status.eq(LeaveStatus::Approved))
        .filter(leave_request::Column::StartDate.lte(last))
        .filter(leave_request::Column::EndDate.gte(first))
        .order_by_asc(leave_request::Column::CreatedAt)
        .all(db)
        .await?;

    let work = work_seconds_map(&logs);
    let leave = leave_map(&leaves, first, last);
    let total = total_working_days(first, policy);

    let empty_work = HashMap::new();
    let empty_leave = HashMap::new();

    Ok(employee_ids
        .into_iter()
        .filter(|id| work.contains_key(id) || leave.contains_key(id))
        .map(|id| {
            let days = build_day_records(
                first,
                work.get(&id).unwrap_or(&empty_work),
                leave.get(&id).unwrap_or(&empty_leave),
                policy,
            );

            (id, summarize(id, &days, total))
        })
        .collect())
}

/// One summary per employee of the company that has attendance facts.
pub async fn payable_summaries<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    first: NaiveDate,
    policy: &PayrollPolicy,
) -> Result<Vec<MonthPayableSummary>, DbErr> {
    let employee_ids: Vec<Uuid> = Employee::find()
        .filter(employee::Column::CompanyId.eq(company_id))
        .all(db)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();

    let mut summaries: Vec<_> = summaries_for_employees(db, employee_ids, first, policy)
        .await?
        .into_values()
        .collect();
    summaries.sort_by_key(|s| s.employee_id);

    Ok(summaries)
}

/// Self-service view: every day of the month plus the aggregated KPIs.
pub async fn attendance_me<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
    first: NaiveDate,
    policy: &PayrollPolicy,
) -> Result<AttendanceMe, DbErr> {
    let last = utils::last_of_month(first);
    let (month_start, month_end) = utils::month_datetime_range(first);

    let logs = TimeLog::find()
        .filter(time_log::Column::EmployeeId.eq(employee_id))
        .filter(time_log::Column::StartedAt.gte(month_start))
        .filter(time_log::Column::StartedAt.lt(month_end))
        .filter(time_log::Column::EndedAt.is_not_null())
        .all(db)
        .await?;

    let leaves = LeaveRequest::find()
        .filter(leave_request::Column::EmployeeId.eq(employee_id))
        .filter(leave_request::Column::Status.eq(LeaveStatus::Approved))
        .filter(leave_request::Column::StartDate.lte(last))
        .filter(leave_request::Column::EndDate.gte(first))
        .order_by_asc(leave_request::Column::CreatedAt)
        .all(db)
        .await?;

    let work = work_seconds_map(&logs);
    let leave = leave_map(&leaves, first, last);

    let empty_work = HashMap::new();
    let empty_leave = HashMap::new();

    let days = build_day_records(
        first,
        work.get(&employee_id).unwrap_or(&empty_work),
        leave.get(&employee_id).unwrap_or(&empty_leave),
        policy,
    );

    let summary = summarize(employee_id, &days, total_working_days(first, policy));
    let total_work_hours = days.iter().map(|d| d.work_seconds).sum::<i64>() as f64 / 3600.0;

    Ok(AttendanceMe {
        kpi: AttendanceKpi {
            total_working_days: summary.total_working_days,
            present_days: summary.present_days,
            paid_leave_days: summary.paid_leave_days,
            unpaid_leave_days: summary.unpaid_leave_days,
            payable_days: summary.payable_days,
            total_work_hours,
        },
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Local, TimeZone as _};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn leave_request(
        employee_id: Uuid,
        leave_type: LeaveType,
        start: NaiveDate,
        end: NaiveDate,
        created_minute: u32,
    ) -> leave_request::Model {
        leave_request::Model {
            id: Uuid::new_v4(),
            created_at: Local.with_ymd_and_hms(2024, 5, 1, 8, created_minute, 0).unwrap().fixed_offset(),
            updated_at: Local::now().into(),
            employee_id,
            leave_type,
            status: LeaveStatus::Approved,
            start_date: start,
            end_date: end,
            approved_by: None,
        }
    }

    #[test]
    fn test_leave_overrides_presence() {
        let policy = PayrollPolicy::default();

        // 8 hours worked, but the day is covered by leave
        assert!(!is_present(8 * 3600, Some(LeaveType::Casual), &policy));
        assert!(is_present(8 * 3600, None, &policy));
    }

    #[test]
    fn test_presence_threshold_boundary() {
        let policy = PayrollPolicy::default();

        assert!(is_present(4 * 3600, None, &policy));
        assert!(!is_present(4 * 3600 - 1, None, &policy));
        assert!(!is_present(0, None, &policy));
    }

    #[test]
    fn test_overlapping_leave_earliest_created_wins() {
        let employee_id = Uuid::new_v4();
        let first = date(2024, 6, 1);
        let last = date(2024, 6, 30);

        // Ordered by created_at ascending, as the query guarantees
        let requests = vec![
            leave_request(employee_id, LeaveType::Sick, date(2024, 6, 10), date(2024, 6, 12), 0),
            leave_request(employee_id, LeaveType::Unpaid, date(2024, 6, 12), date(2024, 6, 14), 1),
        ];

        let map = leave_map(&requests, first, last);
        let days = &map[&employee_id];

        assert_eq!(days[&date(2024, 6, 12)], LeaveType::Sick);
        assert_eq!(days[&date(2024, 6, 13)], LeaveType::Unpaid);
        assert_eq!(days.len(), 5);
    }

    #[test]
    fn test_leave_clamped_to_month() {
        let employee_id = Uuid::new_v4();

        let requests = vec![
            leave_request(employee_id, LeaveType::Casual, date(2024, 5, 28), date(2024, 6, 3), 0),
        ];

        let map = leave_map(&requests, date(2024, 6, 1), date(2024, 6, 30));

        assert_eq!(map[&employee_id].len(), 3);
    }

    #[test]
    fn test_summarize_counts() {
        let policy = PayrollPolicy::default();
        let employee_id = Uuid::new_v4();
        let first = date(2024, 6, 1);

        let mut work = HashMap::new();
        for day in 3..=7 {
            work.insert(date(2024, 6, day), 8 * 3600);
        }
        // Below threshold, not present
        work.insert(date(2024, 6, 10), 3600);

        let mut leave = HashMap::new();
        leave.insert(date(2024, 6, 11), LeaveType::Casual);
        leave.insert(date(2024, 6, 12), LeaveType::Sick);
        leave.insert(date(2024, 6, 13), LeaveType::Unpaid);

        let days = build_day_records(first, &work, &leave, &policy);
        let summary = summarize(employee_id, &days, total_working_days(first, &policy));

        assert_eq!(summary.total_working_days, 20);
        assert_eq!(summary.present_days, 5);
        assert_eq!(summary.paid_leave_days, 2);
        assert_eq!(summary.unpaid_leave_days, 1);
        assert_eq!(summary.payable_days, 7);
    }

    #[test]
    fn test_total_working_days_policy() {
        let first = date(2024, 6, 1);

        let business = PayrollPolicy::default();
        let calendar = PayrollPolicy { business_days_only: false, ..Default::default() };

        assert_eq!(total_working_days(first, &business), 20);
        assert_eq!(total_working_days(first, &calendar), 30);
    }

    #[test]
    fn test_open_intervals_do_not_count() {
        let employee_id = Uuid::new_v4();
        let started_at = Local.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap().fixed_offset();

        let logs = vec![
            time_log::Model {
                id: Uuid::new_v4(),
                created_at: started_at,
                updated_at: started_at,
                employee_id,
                started_at,
                ended_at: None,
            },
        ];

        assert!(work_seconds_map(&logs).is_empty());
    }
}
