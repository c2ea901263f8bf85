/*
 * Unit tests for the dispatch algorithm
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 *  - test_assign_idle_cars_lowest_id_wins
 *  - test_assign_balances_load
 *  - test_assign_skips_unusable_cars
 *  - test_arrival_picks_up_and_stops
 *  - test_arrival_serves_pickup_and_dropoff_together
 *  - test_arrival_twice_is_noop
 *  - test_arrival_unmatched_only_moves_car
 *  - test_next_direction_keeps_direction
 *  - test_next_direction_reverses
 *  - test_next_floor_tie_goes_to_first_assigned
 *  - test_next_direction_stop_without_work
 *  - test_remove_transfers_riding_passenger
 *  - test_remove_moves_waiting_passenger_unchanged
 *  - test_remove_preserves_passengers
 *  - test_remove_last_car_then_assign_fails
 *  - test_remove_without_spare_car_keeps_queue
 *  - test_arrival_of_failed_car_serves_nothing
 *  - test_track_floor_serves_nothing
 *  - test_remove_twice_is_noop
 *  - test_restore_car_gets_next_assignment
 *  - test_reconfigure_grow_and_shrink
 *  - test_unknown_elevator
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod algorithm_tests {
    use crate::dispatch::{DispatchAlgorithm, Request, Served};
    use crate::shared::Direction::{Down, Stop, Up};
    use crate::shared::{Direction, DispatchError, Floor, RequestId};
    use std::collections::HashMap;
    use std::time::Duration;

    fn request(source: Floor, direction: Direction, destination: Floor) -> Request {
        Request::new(Duration::ZERO, source, direction, destination).unwrap()
    }

    // Two cars, car 0 idle at floor 0 and car 1 idle at floor 5
    fn setup_two_cars() -> DispatchAlgorithm {
        let mut dispatch = DispatchAlgorithm::new(2, 0);
        dispatch.report_arrival(1, 5).unwrap();
        dispatch
    }

    #[test]
    fn test_assign_idle_cars_lowest_id_wins() {
        // Purpose: Two idle cars with empty queues, the lowest id gets the request and heads up

        // Arrange
        let mut dispatch = setup_two_cars();

        // Act
        let (id, elevator) = dispatch.assign_request(request(2, Up, 8)).unwrap();
        let direction = dispatch.next_direction(0).unwrap();

        // Assert
        assert_eq!(id, RequestId(0));
        assert_eq!(elevator, 0);
        assert_eq!(direction, Up);
        assert_eq!(dispatch.direction(1).unwrap(), Stop);
    }

    #[test]
    fn test_assign_balances_load() {
        // Purpose: After N assignments without completions, queue lengths differ by at most one

        // Arrange
        let mut dispatch = DispatchAlgorithm::new(3, 0);

        // Act
        for n in 0..10u8 {
            dispatch.assign_request(request(n % 5, Up, 6)).unwrap();
        }

        // Assert
        let lengths: Vec<usize> = (0..3)
            .map(|id| dispatch.pending_requests(id).unwrap().len())
            .collect();
        let max = *lengths.iter().max().unwrap();
        let min = *lengths.iter().min().unwrap();
        assert!(max - min <= 1, "unbalanced queues: {:?}", lengths);
        assert_eq!(lengths.iter().sum::<usize>(), 10);
        assert_eq!(lengths, vec![4, 3, 3]);
    }

    #[test]
    fn test_assign_skips_unusable_cars() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(3, 0);
        dispatch.remove_from_service(0).unwrap();

        // Act
        let (_, first) = dispatch.assign_request(request(1, Up, 3)).unwrap();
        let (_, second) = dispatch.assign_request(request(1, Up, 3)).unwrap();
        let (_, third) = dispatch.assign_request(request(1, Up, 3)).unwrap();

        // Assert
        assert_eq!((first, second, third), (1, 2, 1));
        assert!(dispatch.pending_requests(0).unwrap().is_empty());
    }

    #[test]
    fn test_arrival_picks_up_and_stops() {
        // Purpose: Arriving at the source floor picks the passenger up and requests a stop

        // Arrange
        let mut dispatch = DispatchAlgorithm::new(1, 0);
        let (id, _) = dispatch.assign_request(request(2, Up, 8)).unwrap();
        assert_eq!(dispatch.next_direction(0).unwrap(), Up);

        // Act
        let served = dispatch.report_arrival(0, 2).unwrap();

        // Assert
        assert_eq!(served, vec![(id, Served::Pickup)]);
        assert!(dispatch.request(id).unwrap().is_picked_up());
        assert_eq!(dispatch.direction(0).unwrap(), Stop);
        assert!(dispatch.stop_requested(0).unwrap());
        assert_eq!(dispatch.current_floor(0).unwrap(), 2);

        // Act
        dispatch.clear_stop(0).unwrap();
        let direction = dispatch.next_direction(0).unwrap();

        // Assert
        assert!(!dispatch.stop_requested(0).unwrap());
        assert_eq!(dispatch.next_floor(0).unwrap(), Some(8));
        assert_eq!(direction, Up);
    }

    #[test]
    fn test_arrival_serves_pickup_and_dropoff_together() {
        // Purpose: One arrival completes every matching request, not just the first

        // Arrange
        let mut dispatch = DispatchAlgorithm::new(1, 0);
        let (first, _) = dispatch.assign_request(request(2, Up, 6)).unwrap();
        let (second, _) = dispatch.assign_request(request(6, Down, 1)).unwrap();
        dispatch.report_arrival(0, 2).unwrap();
        dispatch.clear_stop(0).unwrap();

        // Act
        let served = dispatch.report_arrival(0, 6).unwrap();

        // Assert
        assert_eq!(
            served,
            vec![(first, Served::Dropoff), (second, Served::Pickup)]
        );
        assert!(dispatch.request(first).unwrap().is_complete());
        assert_eq!(dispatch.pending_requests(0).unwrap().len(), 1);
    }

    #[test]
    fn test_arrival_twice_is_noop() {
        // Purpose: Reporting the same arrival again changes nothing

        // Arrange
        let mut dispatch = DispatchAlgorithm::new(1, 0);
        dispatch.assign_request(request(3, Up, 5)).unwrap();
        dispatch.report_arrival(0, 3).unwrap();
        let car_before = dispatch.test_get_car(0).clone();
        let requests_before = dispatch.requests().to_vec();

        // Act
        let served = dispatch.report_arrival(0, 3).unwrap();

        // Assert
        assert!(served.is_empty());
        assert_eq!(*dispatch.test_get_car(0), car_before);
        assert_eq!(dispatch.requests(), &requests_before[..]);
    }

    #[test]
    fn test_arrival_unmatched_only_moves_car() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(1, 0);
        dispatch.assign_request(request(4, Down, 0)).unwrap();
        dispatch.next_direction(0).unwrap();

        // Act
        let served = dispatch.report_arrival(0, 1).unwrap();

        // Assert
        assert!(served.is_empty());
        assert_eq!(dispatch.current_floor(0).unwrap(), 1);
        assert_eq!(dispatch.direction(0).unwrap(), Up);
        assert!(!dispatch.stop_requested(0).unwrap());
    }

    #[test]
    fn test_next_direction_keeps_direction() {
        // Purpose: A car going up keeps going up while there is a stop above, even if one below is closer

        // Arrange
        let mut dispatch = DispatchAlgorithm::new(1, 0);
        dispatch.assign_request(request(4, Up, 6)).unwrap();
        dispatch.assign_request(request(9, Down, 7)).unwrap();
        dispatch.report_arrival(0, 5).unwrap();
        dispatch.test_set_direction(0, Up);

        // Act
        let target = dispatch.next_floor(0).unwrap();
        let direction = dispatch.next_direction(0).unwrap();

        // Assert
        assert_eq!(target, Some(9));
        assert_eq!(direction, Up);
    }

    #[test]
    fn test_next_direction_reverses() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(1, 0);
        dispatch.assign_request(request(2, Up, 3)).unwrap();
        dispatch.report_arrival(0, 5).unwrap();
        dispatch.test_set_direction(0, Up);

        // Act
        let direction = dispatch.next_direction(0).unwrap();

        // Assert
        assert_eq!(dispatch.next_floor(0).unwrap(), Some(2));
        assert_eq!(direction, Down);
        assert_eq!(dispatch.direction(0).unwrap(), Down);
    }

    #[test]
    fn test_next_floor_tie_goes_to_first_assigned() {
        // Purpose: Equal distances resolve to queue order, not floor number

        // Arrange
        let mut upper_first = DispatchAlgorithm::new(1, 0);
        upper_first.report_arrival(0, 5).unwrap();
        upper_first.assign_request(request(7, Up, 9)).unwrap();
        upper_first.assign_request(request(3, Up, 4)).unwrap();

        let mut lower_first = DispatchAlgorithm::new(1, 0);
        lower_first.report_arrival(0, 5).unwrap();
        lower_first.assign_request(request(3, Up, 4)).unwrap();
        lower_first.assign_request(request(7, Up, 9)).unwrap();

        // Act & Assert
        assert_eq!(upper_first.next_floor(0).unwrap(), Some(7));
        assert_eq!(upper_first.next_direction(0).unwrap(), Up);
        assert_eq!(lower_first.next_floor(0).unwrap(), Some(3));
        assert_eq!(lower_first.next_direction(0).unwrap(), Down);
    }

    #[test]
    fn test_next_direction_stop_without_work() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(2, 0);
        let (id, _) = dispatch.assign_request(request(0, Up, 1)).unwrap();
        dispatch.report_arrival(0, 0).unwrap();
        dispatch.report_arrival(0, 1).unwrap();

        // Act & Assert
        assert!(dispatch.request(id).unwrap().is_complete());
        assert!(!dispatch.has_pending_work(0).unwrap());
        assert_eq!(dispatch.next_floor(0).unwrap(), None);
        assert_eq!(dispatch.next_direction(0).unwrap(), Stop);
        assert_eq!(dispatch.next_direction(1).unwrap(), Stop);
    }

    #[test]
    fn test_remove_transfers_riding_passenger() {
        // Purpose: A passenger on board a failed car continues from the failure floor on another car

        // Arrange
        let mut dispatch = setup_two_cars();
        let (original, elevator) = dispatch.assign_request(request(1, Up, 8)).unwrap();
        assert_eq!(elevator, 0);
        dispatch.report_arrival(0, 1).unwrap();
        dispatch.clear_stop(0).unwrap();
        dispatch.report_arrival(0, 3).unwrap();

        // Act
        let reassigned = dispatch.remove_from_service(0).unwrap();

        // Assert
        assert_eq!(reassigned.len(), 1);
        let (transfer, target) = reassigned[0];
        assert_eq!(target, 1);
        assert_ne!(transfer, original);

        let transfer_request = dispatch.request(transfer).unwrap();
        assert_eq!(transfer_request.source, 3);
        assert_eq!(transfer_request.destination, 8);
        assert_eq!(transfer_request.direction, Up);
        assert!(!transfer_request.is_picked_up());
        assert_eq!(dispatch.request(original).unwrap().transferred_to, Some(transfer));

        assert!(dispatch.test_get_car(0).queue.is_empty());
        assert!(!dispatch.is_usable(0).unwrap());
        assert!(dispatch.stop_requested(0).unwrap());
        assert_eq!(dispatch.direction(0).unwrap(), Stop);
        assert_eq!(dispatch.next_direction(0).unwrap(), Stop);
        assert_eq!(dispatch.status(1).unwrap().pending, vec![transfer]);
    }

    #[test]
    fn test_remove_moves_waiting_passenger_unchanged() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(2, 0);
        let (id, _) = dispatch.assign_request(request(4, Down, 2)).unwrap();

        // Act
        let reassigned = dispatch.remove_from_service(0).unwrap();

        // Assert
        assert_eq!(reassigned, vec![(id, 1)]);
        assert_eq!(dispatch.requests().len(), 1);
        assert_eq!(dispatch.pending_requests(1).unwrap()[0].0, id);
    }

    #[test]
    fn test_remove_preserves_passengers() {
        // Purpose: Every unfinished passenger is queued on exactly one car after a fault

        // Arrange
        let mut dispatch = DispatchAlgorithm::new(3, 0);
        for (source, direction, destination) in [(1, Up, 5), (2, Up, 6), (6, Down, 0), (1, Up, 2), (3, Up, 4), (5, Down, 4)] {
            dispatch.assign_request(request(source, direction, destination)).unwrap();
        }
        // Car 0 holds requests 0 and 3, both from floor 1
        dispatch.report_arrival(0, 1).unwrap();
        dispatch.clear_stop(0).unwrap();
        dispatch.report_arrival(0, 2).unwrap();
        let passengers_before = dispatch.requests().iter().filter(|r| !r.is_complete()).count();

        // Act
        dispatch.remove_from_service(0).unwrap();

        // Assert
        let mut references: HashMap<RequestId, usize> = HashMap::new();
        for status in dispatch.statuses() {
            for id in status.pending {
                *references.entry(id).or_insert(0) += 1;
            }
        }
        let passengers_after: Vec<RequestId> = dispatch
            .requests()
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_complete() && r.transferred_to.is_none())
            .map(|(i, _)| RequestId(i))
            .collect();

        assert_eq!(passengers_after.len(), passengers_before);
        for id in passengers_after {
            assert_eq!(references.get(&id), Some(&1), "request {} not queued exactly once", id);
        }
        assert!(dispatch.status(0).unwrap().pending.is_empty());
    }

    #[test]
    fn test_remove_last_car_then_assign_fails() {
        // Purpose: With every car out of service assignment is a fatal configuration error

        // Arrange
        let mut dispatch = DispatchAlgorithm::new(1, 0);

        // Act
        let removed = dispatch.remove_from_service(0);
        let result = dispatch.assign_request(request(0, Up, 3));

        // Assert
        assert_eq!(removed, Ok(vec![]));
        assert_eq!(result, Err(DispatchError::NoUsableElevator));
        assert!(result.unwrap_err().is_fatal());
        assert!(dispatch.requests().is_empty());
    }

    #[test]
    fn test_remove_without_spare_car_keeps_queue() {
        // Purpose: A failed car with nowhere to hand its work keeps it instead of losing it

        // Arrange
        let mut dispatch = DispatchAlgorithm::new(2, 0);
        dispatch.remove_from_service(1).unwrap();
        let (id, _) = dispatch.assign_request(request(2, Up, 4)).unwrap();

        // Act
        let result = dispatch.remove_from_service(0);

        // Assert
        assert_eq!(result, Err(DispatchError::NoUsableElevator));
        assert!(!dispatch.is_usable(0).unwrap());
        assert_eq!(dispatch.pending_requests(0).unwrap().len(), 1);

        // Act
        dispatch.restore_to_service(1).unwrap();
        let reassigned = dispatch.remove_from_service(0).unwrap();

        // Assert
        assert_eq!(reassigned, vec![(id, 1)]);
        assert!(dispatch.pending_requests(0).unwrap().is_empty());
    }

    #[test]
    fn test_arrival_of_failed_car_serves_nothing() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(2, 0);
        dispatch.remove_from_service(1).unwrap();
        let (id, _) = dispatch.assign_request(request(3, Up, 5)).unwrap();
        let _ = dispatch.remove_from_service(0);

        // Act
        let served = dispatch.report_arrival(0, 3).unwrap();

        // Assert
        assert!(served.is_empty());
        assert_eq!(dispatch.current_floor(0).unwrap(), 3);
        assert!(!dispatch.request(id).unwrap().is_picked_up());
    }

    #[test]
    fn test_track_floor_serves_nothing() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(1, 0);
        let (id, _) = dispatch.assign_request(request(4, Down, 1)).unwrap();

        // Act
        dispatch.track_floor(0, 4).unwrap();

        // Assert
        assert_eq!(dispatch.current_floor(0).unwrap(), 4);
        assert!(!dispatch.request(id).unwrap().is_picked_up());
        assert!(!dispatch.stop_requested(0).unwrap());
        assert_eq!(dispatch.track_floor(3, 1), Err(DispatchError::UnknownElevator(3)));
    }

    #[test]
    fn test_remove_twice_is_noop() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(2, 0);
        dispatch.assign_request(request(2, Up, 4)).unwrap();
        dispatch.remove_from_service(0).unwrap();
        let requests_before = dispatch.requests().to_vec();

        // Act
        let reassigned = dispatch.remove_from_service(0).unwrap();

        // Assert
        assert!(reassigned.is_empty());
        assert_eq!(dispatch.requests(), &requests_before[..]);
        assert_eq!(dispatch.pending_requests(1).unwrap().len(), 1);
    }

    #[test]
    fn test_restore_car_gets_next_assignment() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(2, 0);
        dispatch.remove_from_service(0).unwrap();
        dispatch.assign_request(request(1, Up, 2)).unwrap();

        // Act
        dispatch.restore_to_service(0).unwrap();

        // Assert
        assert!(dispatch.is_usable(0).unwrap());
        assert!(!dispatch.stop_requested(0).unwrap());
        assert!(!dispatch.has_pending_work(0).unwrap());
        let (_, elevator) = dispatch.assign_request(request(1, Up, 2)).unwrap();
        assert_eq!(elevator, 0);
    }

    #[test]
    fn test_reconfigure_grow_and_shrink() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(2, 1);

        // Act
        let grown = dispatch.reconfigure(4).unwrap();
        for _ in 0..4 {
            dispatch.assign_request(request(1, Up, 3)).unwrap();
        }

        // Assert
        assert!(grown.is_empty());
        assert_eq!(dispatch.n_elevators(), 4);
        assert_eq!(dispatch.current_floor(3).unwrap(), 1);
        for id in 0..4 {
            assert_eq!(dispatch.pending_requests(id).unwrap().len(), 1);
        }

        // Act
        let reassigned = dispatch.reconfigure(2).unwrap();

        // Assert
        assert_eq!(reassigned, vec![(RequestId(2), 0), (RequestId(3), 1)]);
        assert_eq!(dispatch.n_elevators(), 2);
        assert_eq!(dispatch.pending_requests(0).unwrap().len(), 2);
        assert_eq!(dispatch.pending_requests(1).unwrap().len(), 2);
        assert_eq!(dispatch.reconfigure(0), Err(DispatchError::EmptyPool));
        assert_eq!(
            dispatch.current_floor(2),
            Err(DispatchError::UnknownElevator(2))
        );
    }

    #[test]
    fn test_unknown_elevator() {
        // Arrange
        let mut dispatch = DispatchAlgorithm::new(2, 0);

        // Act & Assert
        assert_eq!(
            dispatch.report_arrival(7, 1),
            Err(DispatchError::UnknownElevator(7))
        );
        assert_eq!(
            dispatch.next_direction(2),
            Err(DispatchError::UnknownElevator(2))
        );
        assert_eq!(
            dispatch.remove_from_service(3),
            Err(DispatchError::UnknownElevator(3))
        );
    }
}
